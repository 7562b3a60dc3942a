//! Best-effort product signals read from storefront markup.
//!
//! [`extract_signals`] runs over a scope element (a product card, or the
//! document root on a product page) and never fails: every strategy that
//! finds nothing degrades to an absent signal.

mod created;
pub mod embedded;
mod freshness;
mod price;

use chrono::{DateTime, Utc};
use scraper::ElementRef;
use serde::Serialize;

/// Where a signal value was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalSource {
    Selector,
    StruckThrough,
    Keyword,
    DeEmphasized,
    PriceSpread,
    DataAttribute,
    JsonLd,
    MetaTag,
    EmbeddedJson,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSignals {
    /// Pre-discount price, present only when strictly positive.
    pub compare_at_price: Option<f64>,
    pub created_at: Option<DateTime<Utc>>,
    /// The markup itself flags the product as new.
    pub looks_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compare_at_source: Option<SignalSource>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at_source: Option<SignalSource>,
}

/// Extracts [`ProductSignals`] from everything under `scope`, including the
/// scope element's own attributes.
#[must_use]
pub fn extract_signals(scope: ElementRef<'_>) -> ProductSignals {
    let (compare_at_price, compare_at_source) = price::compare_at_price(scope).unzip();
    let (created_at, created_at_source) = created::created_at(scope).unzip();

    ProductSignals {
        compare_at_price,
        created_at,
        looks_new: freshness::looks_new(scope),
        compare_at_source,
        created_at_source,
    }
}
