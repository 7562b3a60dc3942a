//! Integration tests for `AdminClient::list_products`.
//!
//! Uses `wiremock` to stand in for the shop's Admin GraphQL endpoint.

use labelkit_core::ShopifyCredentials;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labelkit_shopify::{AdminClient, ProductQuery, ShopifyError};

const GRAPHQL_PATH: &str = "/admin/api/2024-10/graphql.json";

fn credentials(server: &MockServer) -> ShopifyCredentials {
    ShopifyCredentials {
        shop_domain: server.uri(),
        admin_token: "shpat_test".to_string(),
        api_version: "2024-10".to_string(),
    }
}

/// No retries, no backoff.
fn test_client(server: &MockServer) -> AdminClient {
    AdminClient::new(&credentials(server), 5, "labelkit-test/0.1", 0, 0)
        .expect("failed to build test AdminClient")
}

fn test_client_with_retries(server: &MockServer, max_retries: u32) -> AdminClient {
    AdminClient::new(&credentials(server), 5, "labelkit-test/0.1", max_retries, 0)
        .expect("failed to build test AdminClient")
}

fn products_body(has_next_page: bool) -> serde_json::Value {
    json!({
        "data": {
            "products": {
                "pageInfo": {"hasNextPage": has_next_page, "endCursor": "cursor-1"},
                "edges": [
                    {"node": {
                        "id": "gid://shopify/Product/8123",
                        "title": "Linen shirt",
                        "createdAt": "2026-09-30T12:00:00Z",
                        "featuredImage": {"url": "https://cdn.shopify.com/linen.jpg"},
                        "variants": {"edges": [{"node": {"price": "30.00", "compareAtPrice": "40.00"}}]}
                    }},
                    {"node": {
                        "id": "gid://shopify/Product/8124",
                        "title": "Linen trousers",
                        "createdAt": "2026-08-01T12:00:00Z",
                        "featuredImage": null,
                        "variants": {"edges": []}
                    }}
                ]
            }
        },
        "extensions": {"cost": {"requestedQueryCost": 12}}
    })
}

#[tokio::test]
async fn list_products_sends_token_and_search_filter() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(header("X-Shopify-Access-Token", "shpat_test"))
        .and(body_partial_json(json!({
            "variables": {"first": 20, "query": "title:*linen*"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(true)))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .list_products(&ProductQuery::new(None, None, Some("linen".into())))
        .await
        .expect("list_products failed");

    assert!(page.has_next_page);
    assert_eq!(page.end_cursor.as_deref(), Some("cursor-1"));
    assert_eq!(page.products.len(), 2);
    assert_eq!(page.products[0].compare_at_price.as_deref(), Some("40.00"));
    assert!(page.products[1].image_url.is_none());
    assert!(page.products[1].price.is_none());
}

#[tokio::test]
async fn list_products_passes_cursor_and_clamped_page_size() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .and(body_partial_json(json!({
            "variables": {"first": 50, "after": "cursor-1"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(false)))
        .expect(1)
        .mount(&server)
        .await;

    let page = test_client(&server)
        .list_products(&ProductQuery::new(Some(999), Some("cursor-1".into()), None))
        .await
        .expect("list_products failed");

    assert!(!page.has_next_page);
}

#[tokio::test]
async fn throttled_response_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Throttled", "extensions": {"code": "THROTTLED"}}]
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(products_body(false)))
        .mount(&server)
        .await;

    let page = test_client_with_retries(&server, 2)
        .list_products(&ProductQuery::default())
        .await
        .expect("retry should recover");

    assert_eq!(page.products.len(), 2);
}

#[tokio::test]
async fn http_429_without_retries_is_rate_limited() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "4"))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .list_products(&ProductQuery::default())
        .await;

    match result {
        Err(ShopifyError::RateLimited {
            retry_after_secs, ..
        }) => assert_eq!(retry_after_secs, 4),
        other => panic!("expected RateLimited, got: {other:?}"),
    }
}

#[tokio::test]
async fn rejected_token_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = test_client_with_retries(&server, 3)
        .list_products(&ProductQuery::default())
        .await;

    assert!(
        matches!(result, Err(ShopifyError::Unauthorized { status: 401, .. })),
        "expected Unauthorized, got: {result:?}"
    );
}

#[tokio::test]
async fn graphql_errors_are_surfaced() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [
                {"message": "Field 'bogus' doesn't exist on type 'Product'"},
                {"message": "Access denied for products field."}
            ]
        })))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .list_products(&ProductQuery::default())
        .await;

    match result {
        Err(ShopifyError::GraphQl { messages }) => {
            assert!(messages.contains("bogus"));
            assert!(messages.contains("Access denied"));
        }
        other => panic!("expected GraphQl, got: {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_a_deserialize_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let result = test_client(&server)
        .list_products(&ProductQuery::default())
        .await;

    assert!(matches!(result, Err(ShopifyError::Deserialize { .. })));
}
