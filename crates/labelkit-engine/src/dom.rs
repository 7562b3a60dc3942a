//! Tree helpers over a parsed `scraper::Html` document.
//!
//! Every scan skips badges this crate injected on an earlier pass, so
//! re-running the engine over its own output never reads a badge as a
//! storefront signal.

use scraper::{node::Node, ElementRef, Selector};

/// Class carried by every badge element the renderer injects.
pub const BADGE_CLASS: &str = "labelkit-badge";

const NON_VISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

/// Returns `true` if the element is an injected badge.
#[must_use]
pub fn is_badge(el: ElementRef<'_>) -> bool {
    el.value().classes().any(|class| class == BADGE_CLASS)
}

/// Returns `true` if the element is an injected badge or sits inside one.
#[must_use]
pub fn is_injected(el: ElementRef<'_>) -> bool {
    is_badge(el) || el.ancestors().filter_map(ElementRef::wrap).any(is_badge)
}

/// The scope element followed by all its descendant elements in document
/// order, minus injected badges.
pub fn elements(scope: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    scope
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| !is_injected(*el))
}

/// Elements matching `selector`, considering the scope element itself first
/// and then its descendants.
#[must_use]
pub fn select_in<'a>(scope: ElementRef<'a>, selector: &Selector) -> Vec<ElementRef<'a>> {
    let mut out = Vec::new();
    if selector.matches(&scope) && !is_injected(scope) {
        out.push(scope);
    }
    out.extend(scope.select(selector).filter(|el| !is_injected(*el)));
    out
}

/// First element matched by any selector of an ordered list.
#[must_use]
pub fn first_match<'a>(scope: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors
        .iter()
        .find_map(|selector| select_in(scope, selector).into_iter().next())
}

/// Visible text under `el` with whitespace collapsed. Script-like elements
/// and injected badges contribute nothing.
#[must_use]
pub fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                out.push_str(text);
                out.push(' ');
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_badge(child_el) && !is_non_visible(child_el) {
                        collect_text(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Individual visible text nodes under `scope`, trimmed and non-empty.
#[must_use]
pub fn text_nodes(scope: ElementRef<'_>) -> Vec<String> {
    let mut out = Vec::new();
    collect_text_nodes(scope, &mut out);
    out
}

fn collect_text_nodes(el: ElementRef<'_>, out: &mut Vec<String>) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => {
                let collapsed = collapse_whitespace(text);
                if !collapsed.is_empty() {
                    out.push(collapsed);
                }
            }
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    if !is_badge(child_el) && !is_non_visible(child_el) {
                        collect_text_nodes(child_el, out);
                    }
                }
            }
            _ => {}
        }
    }
}

/// Visible elements under `scope` that have no element children.
#[must_use]
pub fn leaf_elements(scope: ElementRef<'_>) -> Vec<ElementRef<'_>> {
    elements(scope)
        .filter(|el| !is_non_visible(*el))
        .filter(|el| !el.children().any(|c| c.value().is_element()))
        .collect()
}

fn is_non_visible(el: ElementRef<'_>) -> bool {
    NON_VISIBLE_TAGS.contains(&el.value().name())
}

/// Value of one property from the element's inline `style` attribute,
/// lowercased. The last declaration wins.
#[must_use]
pub fn inline_style(el: ElementRef<'_>, property: &str) -> Option<String> {
    let style = el.value().attr("style")?;
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .filter(|(name, _)| name.trim().eq_ignore_ascii_case(property))
        .map(|(_, value)| value.trim().to_ascii_lowercase())
        .last()
}

/// Returns the nearest ancestor element.
#[must_use]
pub fn parent_element(el: ElementRef<'_>) -> Option<ElementRef<'_>> {
    el.parent().and_then(ElementRef::wrap)
}

#[must_use]
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
