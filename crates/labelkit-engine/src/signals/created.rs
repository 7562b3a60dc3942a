//! Product creation date extraction.

use chrono::{DateTime, Utc};
use scraper::ElementRef;
use serde_json::Value;

use super::embedded::{embedded_objects, find_key_map, json_ld_blocks, json_ld_products};
use super::SignalSource;
use crate::dom::select_in;
use crate::parse_helpers::parse_date;
use crate::selectors::created;

const JSON_LD_KEYS: &[&str] = &["dateCreated", "datePublished", "createdAt"];
const EMBEDDED_KEYS: &[&str] = &["created_at", "createdAt", "published_at", "publishedAt"];

pub(super) fn created_at(scope: ElementRef<'_>) -> Option<(DateTime<Utc>, SignalSource)> {
    from_data_attributes(scope)
        .map(|dt| (dt, SignalSource::DataAttribute))
        .or_else(|| from_json_ld(scope).map(|dt| (dt, SignalSource::JsonLd)))
        .or_else(|| from_meta_tags(scope).map(|dt| (dt, SignalSource::MetaTag)))
        .or_else(|| from_embedded(scope).map(|dt| (dt, SignalSource::EmbeddedJson)))
}

fn from_data_attributes(scope: ElementRef<'_>) -> Option<DateTime<Utc>> {
    created::DATA
        .iter()
        .zip(created::DATA_ATTRIBUTES)
        .find_map(|(selector, attr)| {
            select_in(scope, selector)
                .into_iter()
                .filter_map(|el| el.value().attr(attr))
                .find_map(parse_date)
        })
}

fn from_json_ld(scope: ElementRef<'_>) -> Option<DateTime<Utc>> {
    json_ld_blocks(scope).iter().find_map(|block| {
        json_ld_products(block).into_iter().find_map(|product| {
            JSON_LD_KEYS
                .iter()
                .filter_map(|key| product.get(*key))
                .find_map(json_date)
        })
    })
}

fn from_meta_tags(scope: ElementRef<'_>) -> Option<DateTime<Utc>> {
    created::META.iter().find_map(|selector| {
        select_in(scope, selector)
            .into_iter()
            .filter_map(|el| el.value().attr("content"))
            .find_map(parse_date)
    })
}

fn from_embedded(scope: ElementRef<'_>) -> Option<DateTime<Utc>> {
    embedded_objects(scope)
        .iter()
        .find_map(|obj| find_key_map(obj, EMBEDDED_KEYS, &json_date))
}

fn json_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date(s),
        Value::Number(n) => parse_date(&n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use scraper::Html;

    use super::*;

    fn extract(html: &str) -> Option<(DateTime<Utc>, SignalSource)> {
        let doc = Html::parse_document(html);
        created_at(doc.root_element())
    }

    #[test]
    fn data_attribute_on_card() {
        let html = r#"<div class="card" data-created-at="2024-03-01T12:00:00Z"><a href="/products/a">A</a></div>"#;
        assert_eq!(
            extract(html),
            Some((
                Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                SignalSource::DataAttribute
            ))
        );
    }

    #[test]
    fn unparseable_attribute_falls_through() {
        let html = r#"<div data-created-at="soon"><meta property="product:published_time" content="2024-02-02"></div>"#;
        let (dt, source) = extract(html).expect("meta tag date");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 2, 2, 0, 0, 0).unwrap());
        assert_eq!(source, SignalSource::MetaTag);
    }

    #[test]
    fn json_ld_product_date() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@context":"https://schema.org","@type":"Product","name":"Shirt","datePublished":"2024-05-10"}
            </script></head><body></body></html>"#;
        let (dt, source) = extract(html).expect("json-ld date");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 5, 10, 0, 0, 0).unwrap());
        assert_eq!(source, SignalSource::JsonLd);
    }

    #[test]
    fn json_ld_non_product_is_ignored() {
        let html = r#"<script type="application/ld+json">
            {"@type":"Article","datePublished":"2024-05-10"}</script>"#;
        assert_eq!(extract(html), None);
    }

    #[test]
    fn embedded_product_json_created_at() {
        let html = r#"<script type="application/json">{"product":{"id":1,"created_at":"2024-01-15 10:00:00 -0500"}}</script>"#;
        let (dt, source) = extract(html).expect("embedded date");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap());
        assert_eq!(source, SignalSource::EmbeddedJson);
    }

    #[test]
    fn pre_2001_dates_are_rejected() {
        let html = r#"<div data-created-at="1999-01-01"></div>"#;
        assert_eq!(extract(html), None);
    }
}
