//! Decides whether a label applies to one product.

use std::fmt;

use chrono::{DateTime, Utc};
use labelkit_core::{Label, MatchRule, NeverReason, RuleKind};

use crate::identity::any_id_matches;
use crate::signals::ProductSignals;

const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Why a label did or did not match.
#[derive(Debug, Clone, PartialEq)]
pub enum DecisionReason {
    Inactive,
    AllProducts,
    ProductListed,
    ProductNotListed,
    NoProductId,
    PriceInRange(f64),
    PriceOutOfRange(f64),
    NoComparePrice,
    CreatedWithinWindow { days: i64 },
    CreatedOutsideWindow { days: i64 },
    LooksNew,
    NoNewSignal,
    Unmatchable(NeverReason),
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inactive => write!(f, "label inactive"),
            Self::AllProducts => write!(f, "applies to all products"),
            Self::ProductListed => write!(f, "product listed"),
            Self::ProductNotListed => write!(f, "product not listed"),
            Self::NoProductId => write!(f, "no product id on page"),
            Self::PriceInRange(p) => write!(f, "compare-at price {p} in range"),
            Self::PriceOutOfRange(p) => write!(f, "compare-at price {p} out of range"),
            Self::NoComparePrice => write!(f, "no compare-at price"),
            Self::CreatedWithinWindow { days } => write!(f, "created {days} day(s) ago"),
            Self::CreatedOutsideWindow { days } => {
                write!(f, "created {days} day(s) ago, outside window")
            }
            Self::LooksNew => write!(f, "no creation date, markup looks new"),
            Self::NoNewSignal => write!(f, "no creation date or new marker"),
            Self::Unmatchable(reason) => write!(f, "never matches: {reason}"),
        }
    }
}

/// One label-versus-product evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    pub label_id: String,
    pub product_id: Option<String>,
    pub matched: bool,
    pub reason: DecisionReason,
}

/// Returns `true` if `label` applies to the product described by `signals`
/// and `product_id`, measured against the current time.
#[must_use]
pub fn evaluate(label: &Label, signals: &ProductSignals, product_id: Option<&str>) -> bool {
    explain_at(label, signals, product_id, Utc::now()).matched
}

/// Full evaluation against an explicit clock.
#[must_use]
pub fn explain_at(
    label: &Label,
    signals: &ProductSignals,
    product_id: Option<&str>,
    now: DateTime<Utc>,
) -> Decision {
    let (matched, reason) = if label.active {
        decide(label, signals, product_id, now)
    } else {
        (false, DecisionReason::Inactive)
    };

    Decision {
        label_id: label.id.clone(),
        product_id: product_id.map(str::to_string),
        matched,
        reason,
    }
}

fn decide(
    label: &Label,
    signals: &ProductSignals,
    product_id: Option<&str>,
    now: DateTime<Utc>,
) -> (bool, DecisionReason) {
    match label.match_rule() {
        MatchRule::AllProducts => (true, DecisionReason::AllProducts),
        MatchRule::SpecificProducts { ids } => match product_id {
            None => (false, DecisionReason::NoProductId),
            Some(pid) if any_id_matches(&ids, pid) => (true, DecisionReason::ProductListed),
            Some(_) => (false, DecisionReason::ProductNotListed),
        },
        MatchRule::RuleBased(RuleKind::SpecialPrice(range)) => {
            match signals.compare_at_price.filter(|p| *p > 0.0) {
                None => (false, DecisionReason::NoComparePrice),
                Some(price) if range.contains(price) => {
                    (true, DecisionReason::PriceInRange(price))
                }
                Some(price) => (false, DecisionReason::PriceOutOfRange(price)),
            }
        }
        MatchRule::RuleBased(RuleKind::NewArrival { max_days }) => match signals.created_at {
            Some(created) => {
                let days = days_since(created, now);
                if days <= i64::from(max_days) {
                    (true, DecisionReason::CreatedWithinWindow { days })
                } else {
                    (false, DecisionReason::CreatedOutsideWindow { days })
                }
            }
            None if signals.looks_new => (true, DecisionReason::LooksNew),
            None => (false, DecisionReason::NoNewSignal),
        },
        MatchRule::Never { reason } => (false, DecisionReason::Unmatchable(reason)),
    }
}

/// Whole days between two instants, rounded up; a timestamp in the future
/// counts the same as one in the past.
fn days_since(created: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let millis = (now - created).num_milliseconds().abs();
    (millis + DAY_MILLIS - 1) / DAY_MILLIS
}

#[cfg(test)]
#[path = "evaluate_test.rs"]
mod tests;
