//! Admin GraphQL product listing types.
//!
//! ## Observed response shape (Admin API 2024-10)
//!
//! `ProductVariant.price` and `compareAtPrice` are `Money` scalars: decimal
//! strings such as `"24.00"`, with `compareAtPrice` `null` when the variant
//! is not on sale. Only the first variant is requested; the admin picker
//! shows one price per product.
//!
//! Throttling arrives as HTTP 200 with an `errors` entry whose
//! `extensions.code` is `THROTTLED` and `data` either absent or `null`.

use serde::{Deserialize, Serialize};

/// Largest page the admin picker may request.
pub const MAX_PAGE_SIZE: u32 = 50;
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    pub first: u32,
    pub after: Option<String>,
    pub query: Option<String>,
}

impl ProductQuery {
    /// Builds a query with `first` clamped to `1..=50` (default 20) and blank
    /// cursors and search terms dropped.
    #[must_use]
    pub fn new(first: Option<u32>, after: Option<String>, query: Option<String>) -> Self {
        let non_blank = |s: Option<String>| {
            s.map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            first: first.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
            after: non_blank(after),
            query: non_blank(query),
        }
    }
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

/// A product as shown in the admin picker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProduct {
    /// Shopify GID, e.g. `gid://shopify/Product/8123`.
    pub id: String,
    pub title: String,
    pub image_url: Option<String>,
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub products: Vec<AdminProduct>,
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlResponse {
    pub data: Option<ProductsData>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlError {
    pub message: String,
    #[serde(default)]
    pub extensions: Option<GraphQlErrorExtensions>,
}

impl GraphQlError {
    pub(crate) fn is_throttled(&self) -> bool {
        self.extensions
            .as_ref()
            .and_then(|e| e.code.as_deref())
            .is_some_and(|code| code == "THROTTLED")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct GraphQlErrorExtensions {
    pub code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductsData {
    pub products: ProductConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductConnection {
    pub page_info: PageInfo,
    pub edges: Vec<Edge<ProductNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub has_next_page: bool,
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Edge<T> {
    pub node: T,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProductNode {
    pub id: String,
    pub title: String,
    pub created_at: Option<String>,
    pub featured_image: Option<Image>,
    pub variants: Option<VariantConnection>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Image {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VariantConnection {
    pub edges: Vec<Edge<VariantNode>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VariantNode {
    pub price: Option<String>,
    pub compare_at_price: Option<String>,
}

impl From<ProductNode> for AdminProduct {
    fn from(node: ProductNode) -> Self {
        let first_variant = node
            .variants
            .and_then(|v| v.edges.into_iter().next())
            .map(|edge| edge.node);
        let (price, compare_at_price) = first_variant
            .map(|v| (v.price, v.compare_at_price))
            .unwrap_or_default();

        Self {
            id: node.id,
            title: node.title,
            image_url: node.featured_image.and_then(|image| image.url),
            price,
            compare_at_price,
            created_at: node.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_size_is_clamped() {
        assert_eq!(ProductQuery::new(None, None, None).first, 20);
        assert_eq!(ProductQuery::new(Some(0), None, None).first, 1);
        assert_eq!(ProductQuery::new(Some(500), None, None).first, 50);
        assert_eq!(ProductQuery::new(Some(35), None, None).first, 35);
    }

    #[test]
    fn blank_cursor_and_query_are_dropped() {
        let q = ProductQuery::new(None, Some("  ".into()), Some(" shirt ".into()));
        assert!(q.after.is_none());
        assert_eq!(q.query.as_deref(), Some("shirt"));
    }

    #[test]
    fn node_flattens_first_variant_and_image() {
        let node: ProductNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Product/1",
            "title": "Linen shirt",
            "createdAt": "2026-09-01T00:00:00Z",
            "featuredImage": {"url": "https://cdn.example/a.jpg"},
            "variants": {"edges": [
                {"node": {"price": "30.00", "compareAtPrice": "40.00"}},
                {"node": {"price": "31.00", "compareAtPrice": null}}
            ]}
        }))
        .unwrap();

        let product = AdminProduct::from(node);
        assert_eq!(product.image_url.as_deref(), Some("https://cdn.example/a.jpg"));
        assert_eq!(product.price.as_deref(), Some("30.00"));
        assert_eq!(product.compare_at_price.as_deref(), Some("40.00"));
    }

    #[test]
    fn product_without_variants_or_image() {
        let node: ProductNode = serde_json::from_value(serde_json::json!({
            "id": "gid://shopify/Product/2",
            "title": "Gift card",
            "featuredImage": null
        }))
        .unwrap();
        let product = AdminProduct::from(node);
        assert!(product.image_url.is_none());
        assert!(product.price.is_none());
        assert!(product.created_at.is_none());
    }
}
