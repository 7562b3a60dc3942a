//! Compare-at ("was") price extraction.
//!
//! Strategies run in a fixed order and the first positive amount wins:
//! known theme selectors, struck-through text, keyword-labelled leaves,
//! visually de-emphasized prices, the spread between several prices, and
//! finally embedded product JSON.

use std::sync::LazyLock;

use regex::Regex;
use scraper::ElementRef;
use serde_json::Value;

use super::embedded::{embedded_objects, find_key_map};
use super::SignalSource;
use crate::dom::{elements, inline_style, leaf_elements, parent_element, select_in, visible_text};
use crate::parse_helpers::{looks_like_price, parse_price};
use crate::selectors::price;

/// The highest of several on-card prices counts as a compare-at price only
/// when it exceeds the next one by more than this factor.
const PRICE_SPREAD_FACTOR: f64 = 1.1;

/// Leaf text longer than this is prose, not a price tag.
const MAX_PRICE_TEXT_CHARS: usize = 32;

const JSON_KEYS: &[&str] = &["compare_at_price", "compareAtPrice", "compare_at_price_min"];

static KEYWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:was|compare(?:[- ]at)?|original|regular|list price|msrp|rrp)\b")
        .expect("valid regex")
});

pub(super) fn compare_at_price(scope: ElementRef<'_>) -> Option<(f64, SignalSource)> {
    from_selectors(scope)
        .map(|p| (p, SignalSource::Selector))
        .or_else(|| struck_through(scope).map(|p| (p, SignalSource::StruckThrough)))
        .or_else(|| keyword_leaf(scope).map(|p| (p, SignalSource::Keyword)))
        .or_else(|| de_emphasized(scope).map(|p| (p, SignalSource::DeEmphasized)))
        .or_else(|| price_spread(scope).map(|p| (p, SignalSource::PriceSpread)))
        .or_else(|| embedded(scope).map(|p| (p, SignalSource::EmbeddedJson)))
}

fn from_selectors(scope: ElementRef<'_>) -> Option<f64> {
    price::COMPARE_AT.iter().find_map(|selector| {
        select_in(scope, selector).into_iter().find_map(|el| {
            price::DATA_ATTRIBUTES
                .iter()
                .filter_map(|attr| el.value().attr(attr))
                .find_map(parse_price)
                .or_else(|| parse_price(&visible_text(el)))
        })
    })
}

fn struck_through(scope: ElementRef<'_>) -> Option<f64> {
    elements(scope)
        .filter(|el| price::STRUCK_THROUGH.matches(el) || has_line_through(*el))
        .find_map(|el| parse_price(&visible_text(el)))
}

fn has_line_through(el: ElementRef<'_>) -> bool {
    ["text-decoration", "text-decoration-line"]
        .iter()
        .filter_map(|prop| inline_style(el, prop))
        .any(|value| value.contains("line-through"))
}

fn keyword_leaf(scope: ElementRef<'_>) -> Option<f64> {
    leaf_elements(scope).into_iter().find_map(|el| {
        let text = visible_text(el);
        if KEYWORD_RE.is_match(&text) {
            parse_price(&text)
        } else {
            None
        }
    })
}

fn de_emphasized(scope: ElementRef<'_>) -> Option<f64> {
    leaf_elements(scope)
        .into_iter()
        .filter(|el| is_de_emphasized(*el))
        .find_map(|el| {
            let text = visible_text(el);
            if looks_like_price(&text) {
                parse_price(&text)
            } else {
                None
            }
        })
}

fn is_de_emphasized(el: ElementRef<'_>) -> bool {
    let smaller_than_parent = || {
        let own = inline_style(el, "font-size").and_then(|v| css_length(&v))?;
        let parent = parent_element(el)
            .and_then(|p| inline_style(p, "font-size"))
            .and_then(|v| css_length(&v))?;
        Some(own.1 == parent.1 && own.0 < parent.0)
    };
    let faded = || {
        inline_style(el, "opacity")
            .and_then(|v| v.parse::<f64>().ok())
            .is_some_and(|o| o > 0.0 && o < 1.0)
    };
    let greyed = || inline_style(el, "color").is_some_and(|c| is_grey(&c));

    smaller_than_parent().unwrap_or(false) || faded() || greyed()
}

/// Splits a CSS length such as `12.5px` into its number and unit.
fn css_length(value: &str) -> Option<(f64, String)> {
    let split = value
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(value.len());
    let number = value[..split].parse::<f64>().ok()?;
    Some((number, value[split..].trim().to_string()))
}

/// Neutral, mid-to-light colors: channels within 16 of each other and an
/// average between 96 and 224.
fn is_grey(color: &str) -> bool {
    let rgb = match color.trim() {
        "gray" | "grey" | "darkgray" | "darkgrey" | "lightgray" | "lightgrey" | "silver"
        | "dimgray" | "dimgrey" | "gainsboro" => return true,
        hex if hex.starts_with('#') => parse_hex(&hex[1..]),
        func if func.starts_with("rgb") => parse_rgb_function(func),
        _ => None,
    };
    rgb.is_some_and(|[r, g, b]| {
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let avg = (u16::from(r) + u16::from(g) + u16::from(b)) / 3;
        max - min <= 16 && (96..=224).contains(&avg)
    })
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        3 | 4 => {
            let mut out = [0u8; 3];
            for (i, c) in hex.chars().take(3).enumerate() {
                out[i] = channel(&c.to_string())? * 17;
            }
            Some(out)
        }
        6 | 8 => Some([
            channel(hex.get(0..2)?)?,
            channel(hex.get(2..4)?)?,
            channel(hex.get(4..6)?)?,
        ]),
        _ => None,
    }
}

fn parse_rgb_function(func: &str) -> Option<[u8; 3]> {
    let inner = func.split_once('(')?.1.trim_end_matches(')');
    let mut channels = inner
        .split([',', ' ', '/'])
        .filter(|part| !part.trim().is_empty())
        .map(|part| part.trim().parse::<u8>().ok());
    Some([channels.next()??, channels.next()??, channels.next()??])
}

fn price_spread(scope: ElementRef<'_>) -> Option<f64> {
    let prices: Vec<f64> = leaf_elements(scope)
        .into_iter()
        .map(visible_text)
        .filter(|text| text.chars().count() <= MAX_PRICE_TEXT_CHARS && looks_like_price(text))
        .filter_map(|text| parse_price(&text))
        .collect();
    if prices.len() < 2 {
        return None;
    }

    let mut distinct = prices;
    distinct.sort_by(|a, b| b.total_cmp(a));
    distinct.dedup();
    match distinct.as_slice() {
        [highest, next, ..] if *highest > *next * PRICE_SPREAD_FACTOR => Some(*highest),
        _ => None,
    }
}

fn embedded(scope: ElementRef<'_>) -> Option<f64> {
    embedded_objects(scope)
        .iter()
        .find_map(|obj| find_key_map(obj, JSON_KEYS, &json_amount))
}

/// Integers in theme product JSON are cents; decimals and strings are
/// currency amounts. Storefront API `{ amount }` objects are unwrapped.
fn json_amount(value: &Value) -> Option<f64> {
    #[allow(clippy::cast_precision_loss)]
    let amount = match value {
        Value::Number(n) if n.is_u64() || n.is_i64() => n.as_i64()? as f64 / 100.0,
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_price(s)?,
        Value::Object(map) => return map.get("amount").and_then(json_amount_decimal),
        _ => return None,
    };
    (amount > 0.0).then_some(amount)
}

fn json_amount_decimal(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => parse_price(s)?,
        _ => return None,
    };
    (amount > 0.0).then_some(amount)
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
