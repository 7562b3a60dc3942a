//! "Looks new" heuristics: short new-product text, marker classes and
//! attributes, and badge-like class names mentioning "new".

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;

use crate::dom::{elements, select_in, text_nodes};
use crate::selectors::freshness;

/// Text nodes at or above this length are descriptions, not badges.
const MAX_BADGE_TEXT_CHARS: usize = 50;

static WORD_TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:new|nuevos?|nuevas?|nouveau|nouvelle|nouveautés?|neu|neue|neuheit|nuovo|nuova|novità|novo|nieuw|nytt|nyhet|uusi|yeni|nowy|nowość|новинка|новый|новое)\b",
    )
    .expect("valid regex")
});

const CJK_TOKENS: &[&str] = &["新品", "新着", "新商品", "新作", "신상"];

pub(super) fn looks_new(scope: ElementRef<'_>) -> bool {
    has_new_text(scope) || has_marker(scope) || has_new_badge_class(scope)
}

fn has_new_text(scope: ElementRef<'_>) -> bool {
    text_nodes(scope)
        .iter()
        .filter(|text| text.chars().count() < MAX_BADGE_TEXT_CHARS)
        .any(|text| is_new_token_text(text))
}

/// Text mentioning news or renewal never counts, even next to a "new" token.
pub(super) fn is_new_token_text(text: &str) -> bool {
    let lower = text.to_lowercase();
    if lower.contains("news") || lower.contains("renew") {
        return false;
    }
    WORD_TOKEN_RE.is_match(text) || CJK_TOKENS.iter().any(|token| text.contains(token))
}

fn has_marker(scope: ElementRef<'_>) -> bool {
    freshness::MARKERS
        .iter()
        .any(|selector| !select_in(scope, selector).is_empty())
}

fn has_new_badge_class(scope: ElementRef<'_>) -> bool {
    elements(scope).any(|el| el.value().classes().any(is_new_badge_class))
}

fn is_new_badge_class(class: &str) -> bool {
    let lower = class.to_ascii_lowercase();
    let badge_like = freshness::BADGE_CLASS_FRAGMENTS
        .iter()
        .any(|fragment| lower.contains(fragment));
    badge_like && lower.contains("new") && !lower.contains("news") && !lower.contains("renew")
}
