//! JSON data embedded in storefront markup.

use scraper::ElementRef;
use serde_json::Value;

use crate::dom::select_in;
use crate::parse_helpers::assigned_object;
use crate::selectors::{created, embedded};

/// Assignment targets that carry the Shopify analytics `meta` object.
const ANALYTICS_MARKERS: &[&str] = &["var meta", "ShopifyAnalytics.meta"];

fn script_text(script: ElementRef<'_>) -> String {
    script.text().collect()
}

/// Parsed `<script type="application/json">` blocks in scope.
#[must_use]
pub fn json_blocks(scope: ElementRef<'_>) -> Vec<Value> {
    select_in(scope, &embedded::JSON_SCRIPTS)
        .into_iter()
        .filter_map(|script| serde_json::from_str(script_text(script).trim()).ok())
        .collect()
}

/// Parsed JSON-LD blocks in scope.
#[must_use]
pub fn json_ld_blocks(scope: ElementRef<'_>) -> Vec<Value> {
    select_in(scope, &created::JSON_LD)
        .into_iter()
        .filter_map(|script| serde_json::from_str(script_text(script).trim()).ok())
        .collect()
}

/// The `ShopifyAnalytics.meta` object assigned by an inline script, if any.
#[must_use]
pub fn analytics_meta(scope: ElementRef<'_>) -> Option<Value> {
    select_in(scope, &embedded::SCRIPTS)
        .into_iter()
        .filter(|script| {
            script
                .value()
                .attr("type")
                .is_none_or(|t| t.contains("javascript"))
        })
        .find_map(|script| {
            let text = script_text(script);
            ANALYTICS_MARKERS.iter().find_map(|marker| {
                assigned_object(&text, marker).and_then(|obj| serde_json::from_str(obj).ok())
            })
        })
}

/// Every embedded JSON object in scope: JSON script blocks first, then the
/// analytics meta object.
#[must_use]
pub fn embedded_objects(scope: ElementRef<'_>) -> Vec<Value> {
    let mut objects = json_blocks(scope);
    objects.extend(analytics_meta(scope));
    objects
}

/// Depth-first search for the first of `keys` whose value `parse` accepts.
/// An object's own keys are checked, in the order given, before its
/// children are visited.
pub fn find_key_map<T>(
    value: &Value,
    keys: &[&str],
    parse: &impl Fn(&Value) -> Option<T>,
) -> Option<T> {
    match value {
        Value::Object(map) => keys
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(parse)
            .or_else(|| map.values().find_map(|child| find_key_map(child, keys, parse))),
        Value::Array(items) => items
            .iter()
            .find_map(|child| find_key_map(child, keys, parse)),
        _ => None,
    }
}

/// JSON-LD nodes typed `Product` or `ProductGroup`, including those nested
/// under `@graph`.
#[must_use]
pub fn json_ld_products(value: &Value) -> Vec<&Value> {
    let mut out = Vec::new();
    collect_products(value, &mut out);
    out
}

fn collect_products<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => items.iter().for_each(|item| collect_products(item, out)),
        Value::Object(map) => {
            if map.get("@type").is_some_and(is_product_type) {
                out.push(value);
            }
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
        }
        _ => {}
    }
}

fn is_product_type(ty: &Value) -> bool {
    match ty {
        Value::String(s) => matches!(s.as_str(), "Product" | "ProductGroup"),
        Value::Array(items) => items.iter().any(is_product_type),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use scraper::Html;
    use serde_json::json;

    use super::*;

    #[test]
    fn analytics_meta_is_read_from_inline_script() {
        let doc = Html::parse_document(
            r#"<html><head><script>
            window.ShopifyAnalytics = window.ShopifyAnalytics || {};
            window.ShopifyAnalytics.meta = window.ShopifyAnalytics.meta || {};
            var meta = {"product":{"id":42,"gid":"gid://shopify/Product/42"},"page":{"pageType":"product"}};
            </script></head><body></body></html>"#,
        );
        let meta = analytics_meta(doc.root_element()).expect("meta");
        assert_eq!(meta["product"]["id"], 42);
    }

    #[test]
    fn json_blocks_skip_invalid_json() {
        let doc = Html::parse_document(
            r#"<script type="application/json">{"id": 1}</script>
            <script type="application/json">{broken</script>"#,
        );
        assert_eq!(json_blocks(doc.root_element()), vec![json!({"id": 1})]);
    }

    #[test]
    fn find_key_prefers_own_keys_over_children() {
        let value = json!({
            "variants": [{"compare_at_price": 5000}],
            "compare_at_price": null,
            "compare_at_price_min": 4000
        });
        let found = find_key_map(
            &value,
            &["compare_at_price", "compare_at_price_min"],
            &Value::as_u64,
        );
        assert_eq!(found, Some(4000));
    }

    #[test]
    fn json_ld_products_walks_graph() {
        let value = json!({
            "@context": "https://schema.org",
            "@graph": [
                {"@type": "Organization", "name": "Shop"},
                {"@type": ["Product"], "name": "Shirt"}
            ]
        });
        let products = json_ld_products(&value);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0]["name"], "Shirt");
    }
}
