//! Normalization of a label's loosely typed condition fields into a single
//! [`MatchRule`].
//!
//! This is the only place that knows how `condition`, `ruleType`,
//! `ruleConfig`, and `productIds` interact. Everything downstream matches on
//! the resulting enum.

use serde_json::Value;

use crate::labels::Label;

/// Upper bound used when a special-price rule only specifies `from`.
pub const OPEN_ENDED_PRICE_CEILING: f64 = 999_999.0;

/// Top-level matching mode. `""` and an absent condition mean [`Condition::All`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    All,
    Specific,
    RuleBased,
}

impl Condition {
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Option<Self> {
        match raw.map(str::trim) {
            None | Some("" | "all") => Some(Condition::All),
            Some("specific") => Some(Condition::Specific),
            Some("rule_based") => Some(Condition::RuleBased),
            Some(_) => None,
        }
    }

    /// The canonical stored form.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Condition::All => "all",
            Condition::Specific => "specific",
            Condition::RuleBased => "rule_based",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleType {
    Specific,
    SpecialPrice,
    NewArrival,
}

impl RuleType {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "specific" => Some(RuleType::Specific),
            "special_price" => Some(RuleType::SpecialPrice),
            "new_arrival" => Some(RuleType::NewArrival),
            _ => None,
        }
    }
}

/// Inclusive compare-at price window after defaulting and swapping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceRange {
    pub min: f64,
    pub max: f64,
}

impl PriceRange {
    /// Resolves raw `from`/`to` bounds into a usable range.
    ///
    /// A missing `from` becomes `0` provided `to` is positive; a missing `to`
    /// becomes [`OPEN_ENDED_PRICE_CEILING`] provided `from` is positive.
    /// Inverted bounds are swapped. Returns `None` when no usable range exists.
    #[must_use]
    pub fn resolve(from: Option<f64>, to: Option<f64>) -> Option<Self> {
        let (min, max) = match (from, to) {
            (None, None) => return None,
            (None, Some(to)) if to > 0.0 => (0.0, to),
            (Some(from), None) if from > 0.0 => (from, OPEN_ENDED_PRICE_CEILING),
            (Some(from), Some(to)) => (from, to),
            _ => return None,
        };
        Some(if min > max {
            PriceRange { min: max, max: min }
        } else {
            PriceRange { min, max }
        })
    }

    #[must_use]
    pub fn contains(&self, price: f64) -> bool {
        self.min <= price && price <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    SpecialPrice(PriceRange),
    NewArrival { max_days: u32 },
}

/// Why a label can never match any product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeverReason {
    UnknownCondition(String),
    MissingRuleType,
    UnsupportedRuleType(String),
    InvalidPriceRange,
    InvalidDays,
    NoProductIds,
}

impl std::fmt::Display for NeverReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NeverReason::UnknownCondition(c) => write!(f, "unknown condition '{c}'"),
            NeverReason::MissingRuleType => write!(f, "rule_based label has no rule_type"),
            NeverReason::UnsupportedRuleType(t) => {
                write!(f, "rule_type '{t}' is not valid for rule_based labels")
            }
            NeverReason::InvalidPriceRange => {
                write!(f, "special_price rule needs a usable from/to range")
            }
            NeverReason::InvalidDays => write!(f, "new_arrival rule needs a positive days value"),
            NeverReason::NoProductIds => write!(f, "specific label has no parseable product ids"),
        }
    }
}

/// The normalized matching semantics of a label.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchRule {
    AllProducts,
    /// Raw identifiers as stored; comparison normalizes both sides.
    SpecificProducts {
        ids: Vec<String>,
    },
    RuleBased(RuleKind),
    Never {
        reason: NeverReason,
    },
}

impl Label {
    /// Derives the label's [`MatchRule`].
    ///
    /// `condition == "specific"` always means product-id membership, even when
    /// `ruleType` also carries `special_price`/`new_arrival`. `active` is not
    /// considered here.
    #[must_use]
    pub fn match_rule(&self) -> MatchRule {
        let Some(condition) = Condition::parse(self.condition.as_deref()) else {
            return MatchRule::Never {
                reason: NeverReason::UnknownCondition(
                    self.condition.clone().unwrap_or_default(),
                ),
            };
        };

        match condition {
            Condition::All => MatchRule::AllProducts,
            Condition::Specific => {
                let ids = parse_product_ids(self.product_ids.as_ref());
                if ids.is_empty() {
                    MatchRule::Never {
                        reason: NeverReason::NoProductIds,
                    }
                } else {
                    MatchRule::SpecificProducts { ids }
                }
            }
            Condition::RuleBased => self.rule_based(),
        }
    }

    fn rule_based(&self) -> MatchRule {
        let Some(raw_type) = self.rule_type.as_deref().filter(|t| !t.trim().is_empty()) else {
            return MatchRule::Never {
                reason: NeverReason::MissingRuleType,
            };
        };
        let config = self.rule_config.as_ref();

        match RuleType::parse(raw_type) {
            Some(RuleType::SpecialPrice) => {
                let from = config.and_then(|c| c.get("from")).and_then(parse_number);
                let to = config.and_then(|c| c.get("to")).and_then(parse_number);
                PriceRange::resolve(from, to).map_or(
                    MatchRule::Never {
                        reason: NeverReason::InvalidPriceRange,
                    },
                    |range| MatchRule::RuleBased(RuleKind::SpecialPrice(range)),
                )
            }
            Some(RuleType::NewArrival) => config
                .and_then(|c| c.get("days"))
                .and_then(parse_int)
                .filter(|days| *days > 0)
                .map(|days| u32::try_from(days).unwrap_or(u32::MAX))
                .map_or(
                    MatchRule::Never {
                        reason: NeverReason::InvalidDays,
                    },
                    |max_days| MatchRule::RuleBased(RuleKind::NewArrival { max_days }),
                ),
            Some(RuleType::Specific) | None => MatchRule::Never {
                reason: NeverReason::UnsupportedRuleType(raw_type.to_string()),
            },
        }
    }
}

fn parse_product_ids(raw: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = raw else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads a number the way a browser's `parseFloat` would: JSON numbers as-is,
/// strings by their longest numeric prefix. Non-finite results are rejected.
#[must_use]
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        Value::String(s) => float_prefix(s.trim_start()).filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Reads an integer the way a browser's `parseInt(x, 10)` would.
#[must_use]
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|v| v.is_finite() && v.abs() < 9.0e15)
                .map(|v| {
                    #[allow(clippy::cast_possible_truncation)]
                    let truncated = v.trunc() as i64;
                    truncated
                })
        }),
        Value::String(s) => {
            let s = s.trim_start();
            let bytes = s.as_bytes();
            let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
            let digits_start = end;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end == digits_start {
                return None;
            }
            s[..end].parse::<i64>().ok()
        }
        _ => None,
    }
}

fn float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let mut i = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_start = i;
    while i < len && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let mut mantissa_digits = i - int_start;

    if i < len && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        mantissa_digits += j - frac_start;
        if mantissa_digits > 0 {
            i = j;
        }
    }

    if mantissa_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if i < len && matches!(bytes[i], b'e' | b'E') {
        let mut j = i + 1;
        if j < len && matches!(bytes[j], b'+' | b'-') {
            j += 1;
        }
        let exp_start = j;
        while j < len && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_start {
            i = j;
        }
    }

    s[..i].parse::<f64>().ok()
}
