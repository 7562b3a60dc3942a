//! Low-level parsing primitives shared by the signal extractors.
//!
//! Storefront markup carries prices and dates in whatever format the theme
//! author chose. These routines turn those strings into numbers and
//! timestamps, and pull JSON objects out of inline script text.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

/// Earliest year accepted for a product creation date. Anything older is a
/// zero timestamp or a misparsed number, not a Shopify product.
const MIN_CREATED_YEAR: i32 = 2001;
const MAX_CREATED_YEAR: i32 = 9999;

/// An amount introduced by a currency symbol or code, e.g. `$1,299.00`,
/// `€ 12,50`, `CAD 40`.
static CURRENCY_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:[$€£¥₹₩₽₺]|R\$|kr\.?|zł|chf|usd|eur|gbp|cad|aud|nzd|sek|nok|dkk|jpy)\s?([0-9]{1,3}(?:[.,\u{a0} ][0-9]{3})+(?:[.,][0-9]{1,2})?|[0-9]+(?:[.,][0-9]{1,2})?)",
    )
    .expect("valid regex")
});

/// An amount followed by a currency symbol or code, e.g. `12,50 €`.
static SUFFIX_CURRENCY_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)([0-9]{1,3}(?:[.,\u{a0} ][0-9]{3})+(?:[.,][0-9]{1,2})?|[0-9]+(?:[.,][0-9]{1,2})?)\s?(?:€|£|₽|₺|kr\b|zł|chf\b|eur\b|sek\b|nok\b|dkk\b|pln\b)",
    )
    .expect("valid regex")
});

/// A bare amount with a decimal part, e.g. `1.299,00` or `19.99`.
static DECIMAL_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:[.,\u{a0} ][0-9]{3})+[.,][0-9]{1,2}\b|[0-9]+[.,][0-9]{1,2}\b")
        .expect("valid regex")
});

/// A bare integer amount, optionally grouped, e.g. `1,299` or `40`.
static INTEGER_AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[0-9]{1,3}(?:,[0-9]{3})+|[0-9]+").expect("valid regex")
});

/// Extracts a positive price from free-form text.
///
/// Tries a currency-marked amount first (prefix, then suffix), then a bare
/// decimal amount, then a bare integer. Returns `None` when nothing matches
/// or the amount is not positive.
#[must_use]
pub fn parse_price(text: &str) -> Option<f64> {
    for re in [&*CURRENCY_AMOUNT_RE, &*SUFFIX_CURRENCY_AMOUNT_RE] {
        if let Some(amount) = re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .and_then(|m| parse_amount(m.as_str()))
        {
            return Some(amount);
        }
    }

    [&*DECIMAL_AMOUNT_RE, &*INTEGER_AMOUNT_RE]
        .into_iter()
        .find_map(|re| re.find(text).and_then(|m| parse_amount(m.as_str())))
}

/// Returns `true` when `text` reads as a price, i.e. it carries a currency
/// marker next to an amount.
#[must_use]
pub fn looks_like_price(text: &str) -> bool {
    CURRENCY_AMOUNT_RE.is_match(text) || SUFFIX_CURRENCY_AMOUNT_RE.is_match(text)
}

/// Converts a matched amount string to `f64`, resolving thousands separators
/// and a decimal comma.
///
/// - Both `,` and `.` present: the one occurring last is the decimal mark.
/// - Only `,`: a single comma followed by one or two digits is a decimal
///   comma, anything else is grouping.
/// - Only `.`: several dots, or a single dot followed by exactly three
///   digits, is grouping.
fn parse_amount(raw: &str) -> Option<f64> {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '\u{a0}'))
        .collect();

    let last_comma = compact.rfind(',');
    let last_dot = compact.rfind('.');

    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => compact.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => compact.replace(',', ""),
        (Some(c), None) => {
            let decimals = compact.len() - c - 1;
            if compact.matches(',').count() == 1 && (1..=2).contains(&decimals) {
                compact.replace(',', ".")
            } else {
                compact.replace(',', "")
            }
        }
        (None, Some(d)) => {
            let decimals = compact.len() - d - 1;
            if compact.matches('.').count() > 1 || decimals == 3 {
                compact.replace('.', "")
            } else {
                compact
            }
        }
        (None, None) => compact,
    };

    normalized
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Parses a creation/publication timestamp.
///
/// Accepts RFC 3339, Liquid's default `2024-01-15 10:00:00 -0500`, naive
/// ISO date-times (taken as UTC), bare `YYYY-MM-DD` dates, RFC 2822, and
/// unix epochs in seconds or milliseconds. Results outside the years
/// 2001..=9999 are rejected.
#[must_use]
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    parse_date_string(trimmed)
        .into_iter()
        .chain(parse_epoch(trimmed))
        .find(|dt| (MIN_CREATED_YEAR..=MAX_CREATED_YEAR).contains(&dt.year()))
}

fn parse_date_string(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%dT%H:%M:%S%z", "%Y/%m/%d %H:%M:%S %z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|naive| Utc.from_utc_datetime(&naive));
        }
    }
    DateTime::parse_from_rfc2822(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Interprets a numeric string as epoch seconds, then as epoch milliseconds.
/// Both readings are yielded so the caller's year check picks the sane one.
fn parse_epoch(s: &str) -> Vec<DateTime<Utc>> {
    let Ok(value) = s.parse::<f64>() else {
        return Vec::new();
    };
    if !value.is_finite() {
        return Vec::new();
    }

    #[allow(clippy::cast_possible_truncation)]
    let whole = value.trunc() as i64;
    [
        DateTime::<Utc>::from_timestamp(whole, 0),
        DateTime::<Utc>::from_timestamp_millis(whole),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Returns the balanced `{ ... }` object starting at the first `{` at or
/// after `from`, honouring JSON string literals and escapes.
#[must_use]
pub fn balanced_object(text: &str, from: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = from + text.get(from..)?.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return text.get(start..=start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Locates a JavaScript assignment such as `var meta = {...};` and returns
/// the assigned object literal.
#[must_use]
pub fn assigned_object<'a>(script: &'a str, marker: &str) -> Option<&'a str> {
    let mut search_from = 0usize;
    while let Some(rel) = script.get(search_from..)?.find(marker) {
        let after_marker = search_from + rel + marker.len();
        let rest = script.get(after_marker..)?.trim_start();
        if let Some(after_eq) = rest.strip_prefix('=') {
            if after_eq.trim_start().starts_with('{') {
                let offset = script.len() - after_eq.len();
                return balanced_object(script, offset);
            }
        }
        search_from = after_marker;
    }
    None
}

#[cfg(test)]
#[path = "parse_helpers_test.rs"]
mod tests;
