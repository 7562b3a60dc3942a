//! Canonical product identifiers.
//!
//! The same product reaches the engine as a GraphQL global id from the admin
//! API (`gid://shopify/Product/123`), as a bare numeric id from theme data
//! attributes, or as a handle parsed from a `/products/<handle>` URL.
//! [`normalize`] reduces each to a comparable string and [`ids_match`]
//! compares two raw identifiers through a fixed ladder of equalities.

use serde_json::Value;

const PRODUCT_GID_PREFIX: &str = "gid://shopify/Product/";

/// Canonicalizes a raw product identifier.
///
/// Returns `None` for blank input and for the sentinel strings `"null"`,
/// `"undefined"`, and `"NaN"` that leak out of template and script output.
#[must_use]
pub fn normalize(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || matches!(trimmed, "null" | "undefined" | "NaN") {
        return None;
    }

    if let Some(rest) = trimmed.strip_prefix(PRODUCT_GID_PREFIX) {
        let tail = last_segment(rest);
        return (!tail.is_empty()).then(|| tail.to_string());
    }

    if trimmed.contains("://") && trimmed.contains('/') {
        let tail = last_segment(trimmed);
        if !tail.is_empty() && tail.bytes().all(|b| b.is_ascii_digit()) {
            return Some(tail.to_string());
        }
    }

    Some(trimmed.to_string())
}

/// Normalizes an identifier that arrived as a JSON value (string or number).
#[must_use]
pub fn normalize_value(raw: &Value) -> Option<String> {
    match raw {
        Value::String(s) => normalize(s),
        Value::Number(n) => normalize(&n.to_string()),
        _ => None,
    }
}

/// Returns `true` when two raw identifiers refer to the same product.
///
/// Both sides are normalized first; either side normalizing to `None` never
/// matches. Then, in order: exact equality, integer equality, ASCII
/// case-insensitive equality, and equality after dropping every
/// non-alphanumeric character (only when something remains).
#[must_use]
pub fn ids_match(a: &str, b: &str) -> bool {
    let (Some(a), Some(b)) = (normalize(a), normalize(b)) else {
        return false;
    };

    if a == b {
        return true;
    }

    if let (Some(x), Some(y)) = (parse_integer(&a), parse_integer(&b)) {
        if x == y {
            return true;
        }
    }

    if a.to_lowercase() == b.to_lowercase() {
        return true;
    }

    let stripped_a = alphanumeric_only(&a);
    !stripped_a.is_empty() && stripped_a == alphanumeric_only(&b)
}

/// Returns `true` if `candidate` matches any entry of `ids`.
#[must_use]
pub fn any_id_matches<S: AsRef<str>>(ids: &[S], candidate: &str) -> bool {
    ids.iter().any(|id| ids_match(id.as_ref(), candidate))
}

fn last_segment(s: &str) -> &str {
    let s = s.split(['?', '#']).next().unwrap_or(s);
    s.trim_end_matches('/').rsplit('/').next().unwrap_or_default()
}

fn parse_integer(s: &str) -> Option<i128> {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<i128>().ok()
}

fn alphanumeric_only(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}
