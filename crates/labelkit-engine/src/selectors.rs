//! CSS selectors for Shopify storefront markup.
//!
//! Themes disagree on class names, so most lookups are ordered lists tried
//! front to back. Add new theme variants to the end of a list unless they
//! are more specific than what is already there.

use std::sync::LazyLock;

use scraper::Selector;

fn compile(list: &[&str]) -> Vec<Selector> {
    list.iter()
        .map(|css| Selector::parse(css).expect("valid selector"))
        .collect()
}

fn one(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

/// Compare-at price markup, data attributes first.
pub mod price {
    use super::{compile, LazyLock, Selector};

    /// Data attributes whose value is the compare-at amount.
    pub const DATA_ATTRIBUTES: &[&str] = &[
        "data-compare-at-price",
        "data-compare-price",
        "data-compare-at",
        "data-original-price",
        "data-regular-price",
        "data-was-price",
    ];

    pub static COMPARE_AT: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            "[data-compare-at-price]",
            "[data-compare-price]",
            "[data-compare-at]",
            "[data-original-price]",
            "[data-regular-price]",
            "[data-was-price]",
            ".price__sale .price-item--regular",
            "s.price-item--regular",
            ".price--compare",
            ".price__compare",
            ".price-compare",
            ".compare-at-price",
            ".compare-price",
            ".product-price--compare",
            ".product__price--compare",
            ".product-item__price--compare",
            ".was-price",
            ".price-was",
            ".price--was",
            ".original-price",
            ".old-price",
            "del .money",
            "s .money",
        ])
    });

    /// Tags that strike their content through by default.
    pub static STRUCK_THROUGH: LazyLock<Selector> =
        LazyLock::new(|| super::one("s, del, strike"));
}

/// Product creation and publication dates.
pub mod created {
    use super::{compile, one, LazyLock, Selector};

    pub const DATA_ATTRIBUTES: &[&str] = &[
        "data-product-created-at",
        "data-created-at",
        "data-product-created",
        "data-created",
        "data-date-created",
        "data-product-published-at",
        "data-published-at",
        "data-publish-date",
    ];

    pub static DATA: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            "[data-product-created-at]",
            "[data-created-at]",
            "[data-product-created]",
            "[data-created]",
            "[data-date-created]",
            "[data-product-published-at]",
            "[data-published-at]",
            "[data-publish-date]",
        ])
    });

    pub static META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            r#"meta[property="product:created_time"]"#,
            r#"meta[property="product:published_time"]"#,
            r#"meta[property="article:published_time"]"#,
            r#"meta[property="og:published_time"]"#,
            r#"meta[itemprop="dateCreated"]"#,
            r#"meta[itemprop="datePublished"]"#,
        ])
    });

    pub static JSON_LD: LazyLock<Selector> =
        LazyLock::new(|| one(r#"script[type="application/ld+json"]"#));
}

/// Markers a theme uses to flag a new product.
pub mod freshness {
    use super::{compile, LazyLock, Selector};

    pub static MARKERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            ".new",
            ".is-new",
            ".new-product",
            ".product-new",
            ".product--new",
            ".new-arrival",
            "[data-new]",
            r#"[data-is-new="true"]"#,
            "[data-new-arrival]",
            "[data-new-product]",
        ])
    });

    /// Class fragments naming a badge-like element.
    pub const BADGE_CLASS_FRAGMENTS: &[&str] =
        &["badge", "tag", "label", "sticker", "flag", "ribbon"];
}

/// Inline script blocks carrying product or analytics data.
pub mod embedded {
    use super::{one, LazyLock, Selector};

    pub static JSON_SCRIPTS: LazyLock<Selector> =
        LazyLock::new(|| one(r#"script[type="application/json"]"#));

    pub static SCRIPTS: LazyLock<Selector> = LazyLock::new(|| one("script"));
}

/// Product cards on collection and search pages.
pub mod cards {
    use super::{compile, one, LazyLock, Selector};

    pub static CARDS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            ".product-card-wrapper",
            ".card-wrapper",
            ".product-card",
            ".grid-product",
            ".product-item",
            ".grid__item",
            ".product-grid-item",
            ".collection-product-card",
            ".product-block",
            ".productitem",
            "[data-product-card]",
            "li.product",
        ])
    });

    /// Generic wrappers used when none of [`CARDS`] yields anything.
    pub static FALLBACK_WRAPPER: LazyLock<Selector> = LazyLock::new(|| {
        one(r#"li, article, .card, .product, [data-product-id], [class*="product-card"], [class*="grid__item"], [class*="grid-item"]"#)
    });

    pub static PRODUCT_LINK: LazyLock<Selector> =
        LazyLock::new(|| one(r#"a[href*="/products/"]"#));

    pub static PRODUCT_ID: LazyLock<Selector> = LazyLock::new(|| one("[data-product-id]"));

    pub static MEDIA: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            ".card__media",
            ".product-card__image-wrapper",
            ".product-card__media",
            ".product-card__image",
            ".grid-product__image-wrapper",
            ".grid-product__image-mask",
            ".product-item__image-wrapper",
            ".product-item__media",
            ".product__media",
            ".media",
            ".product-image",
        ])
    });

    pub static IMAGE_WRAPPER: LazyLock<Selector> = LazyLock::new(|| one("[data-image-wrapper]"));

    pub static IMAGE: LazyLock<Selector> = LazyLock::new(|| one("img"));
}

/// Product detail page lookups.
pub mod page {
    use super::{compile, one, LazyLock, Selector};

    pub static PRODUCT_ID_HOLDERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            r#"form[action*="/cart/add"][data-product-id]"#,
            "product-info[data-product-id]",
            r#"[data-section-type="product"][data-product-id]"#,
            ".product-single[data-product-id]",
            ".product[data-product-id]",
            "main [data-product-id]",
        ])
    });

    pub static PRODUCT_ID_INPUT: LazyLock<Selector> = LazyLock::new(|| {
        one(r#"form[action*="/cart/add"] input[name="product-id"], input[name="product-id"]"#)
    });

    pub static MEDIA: LazyLock<Vec<Selector>> = LazyLock::new(|| {
        compile(&[
            "[data-product-media-container]",
            ".product__media-wrapper",
            ".product-single__media-wrapper",
            ".product-single__photos",
            ".product__main-photos",
            ".product-gallery",
            ".product__media",
            ".product-media",
            ".product-images",
            ".product__image-wrapper",
        ])
    });

    pub static MAIN: LazyLock<Selector> = LazyLock::new(|| one("main"));

    pub static BODY: LazyLock<Selector> = LazyLock::new(|| one("body"));
}
