use super::labels::UpdateLabelRequest;
use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use labelkit_core::ShopifyCredentials;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn app(pool: PgPool) -> Router {
    build_app(
        AppState {
            pool,
            shopify: None,
        },
        AuthState::disabled(),
        RateLimits::default(),
    )
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");

    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json parse")
    };
    (status, json)
}

async fn create(pool: &PgPool, body: Value) -> Value {
    let (status, json) = send(app(pool.clone()), "POST", "/api/v1/labels", Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {json}");
    json["data"].clone()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_codes_map_to_statuses() {
    let cases = [
        ("not_found", StatusCode::NOT_FOUND),
        ("rate_limited", StatusCode::TOO_MANY_REQUESTS),
        ("shopify_unconfigured", StatusCode::SERVICE_UNAVAILABLE),
        ("upstream_error", StatusCode::BAD_GATEWAY),
        ("internal_error", StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (code, expected) in cases {
        let response = ApiError::new("req-1", code, "x").into_response();
        assert_eq!(response.status(), expected, "code {code}");
    }
}

#[test]
fn update_request_distinguishes_null_from_absent() {
    let cleared: UpdateLabelRequest =
        serde_json::from_value(json!({"ruleType": null})).expect("parse");
    assert_eq!(cleared.rule_type, Some(None));
    assert_eq!(cleared.rule_config, None);

    let set: UpdateLabelRequest =
        serde_json::from_value(json!({"ruleType": "new_arrival"})).expect("parse");
    assert_eq!(set.rule_type, Some(Some("new_arrival".to_string())));
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_ok(pool: PgPool) {
    let (status, json) = send(app(pool), "GET", "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_routes_require_bearer_token(pool: PgPool) {
    let auth = AuthState::from_keys(&["admin-token".to_string()], false).expect("auth");
    let app = build_app(
        AppState {
            pool,
            shopify: None,
        },
        auth,
        RateLimits::default(),
    );

    let (status, json) = send(app.clone(), "GET", "/api/v1/labels", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"]["code"], "unauthorized");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/labels")
                .header(header::AUTHORIZATION, "Bearer admin-token")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../migrations")]
async fn storefront_routes_skip_auth(pool: PgPool) {
    let auth = AuthState::from_keys(&["admin-token".to_string()], false).expect("auth");
    let app = build_app(
        AppState {
            pool,
            shopify: None,
        },
        auth,
        RateLimits::default(),
    );

    let (status, json) = send(app, "GET", "/apps/labels/labels", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_applies_defaults(pool: PgPool) {
    let label = create(&pool, json!({"text": "  Sale  "})).await;

    assert_eq!(label["text"], "Sale");
    assert_eq!(label["background"], "#000000");
    assert_eq!(label["position"], "bottom-center");
    assert_eq!(label["condition"], "all");
    assert_eq!(label["productIds"], json!([]));
    assert_eq!(label["active"], true);
    assert!(label["createdAt"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_accepts_encoded_rule_config(pool: PgPool) {
    let label = create(
        &pool,
        json!({
            "text": "Deal",
            "condition": "rule_based",
            "ruleType": "special_price",
            "ruleConfig": "{\"from\": 10, \"to\": 50}",
            "position": "top-right"
        }),
    )
    .await;

    assert_eq!(label["condition"], "rule_based");
    assert_eq!(label["ruleConfig"]["to"], 50);
    assert_eq!(label["position"], "top-right");
}

#[sqlx::test(migrations = "../../migrations")]
async fn create_rejects_invalid_labels(pool: PgPool) {
    let cases = [
        json!({"text": ""}),
        json!({"text": "x".repeat(101)}),
        json!({"text": "Sale", "position": "middle"}),
        json!({"text": "Sale", "condition": "sometimes"}),
        json!({"text": "Sale", "condition": "rule_based"}),
        json!({"text": "Sale", "productIds": "not-a-list"}),
    ];
    for body in cases {
        let (status, json) =
            send(app(pool.clone()), "POST", "/api/v1/labels", Some(body.clone())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted {body}");
        assert_eq!(json["error"]["code"], "validation_error");
    }

    let (_, json) = send(app(pool), "GET", "/api/v1/labels", None).await;
    assert_eq!(json["data"], json!([]));
}

#[sqlx::test(migrations = "../../migrations")]
async fn label_crud_round_trip(pool: PgPool) {
    let created = create(
        &pool,
        json!({
            "text": "Picked",
            "condition": "specific",
            "productIds": ["gid://shopify/Product/8123"]
        }),
    )
    .await;
    let id = created["id"].as_str().expect("id").to_string();
    let item_uri = format!("/api/v1/labels/{id}");

    let (status, json) = send(app(pool.clone()), "GET", &item_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["text"], "Picked");

    let (status, json) = send(
        app(pool.clone()),
        "PATCH",
        &item_uri,
        Some(json!({"text": "Hand picked", "active": false})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["text"], "Hand picked");
    assert_eq!(json["data"]["active"], false);
    assert_eq!(json["data"]["condition"], "specific");
    assert_eq!(
        json["data"]["productIds"],
        json!(["gid://shopify/Product/8123"])
    );

    let (status, json) = send(app(pool.clone()), "DELETE", &item_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["deleted"], true);

    let (status, json) = send(app(pool), "GET", &item_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "../../migrations")]
async fn patch_validates_merged_label(pool: PgPool) {
    let created = create(
        &pool,
        json!({
            "text": "New",
            "condition": "rule_based",
            "ruleType": "new_arrival",
            "ruleConfig": {"days": 14}
        }),
    )
    .await;
    let item_uri = format!("/api/v1/labels/{}", created["id"].as_str().expect("id"));

    let (status, _) = send(
        app(pool.clone()),
        "PATCH",
        &item_uri,
        Some(json!({"ruleType": null})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, json) = send(
        app(pool),
        "PATCH",
        &item_uri,
        Some(json!({"condition": "all", "ruleType": null})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["condition"], "all");
    assert!(json["data"]["ruleType"].is_null());
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_or_malformed_ids_are_not_found(pool: PgPool) {
    let (status, _) = send(app(pool.clone()), "GET", "/api/v1/labels/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let missing = format!("/api/v1/labels/{}", uuid::Uuid::new_v4());
    let (status, _) = send(app(pool.clone()), "DELETE", &missing, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(app(pool), "PATCH", &missing, Some(json!({"text": "x"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../migrations")]
async fn storefront_serves_active_labels_as_bare_array(pool: PgPool) {
    create(&pool, json!({"text": "First"})).await;
    create(&pool, json!({"text": "Hidden", "active": false})).await;
    create(&pool, json!({"text": "Second"})).await;

    for uri in ["/api/v1/storefront/labels", "/apps/labels/labels"] {
        let response = app(pool.clone())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).expect("cache-control"),
            "public, max-age=60"
        );
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        let json: Value = serde_json::from_slice(&body).expect("json parse");
        let texts: Vec<&str> = json
            .as_array()
            .expect("bare array")
            .iter()
            .filter_map(|l| l["text"].as_str())
            .collect();
        assert_eq!(texts, vec!["First", "Second"], "uri {uri}");
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn products_without_credentials_is_unavailable(pool: PgPool) {
    let (status, json) = send(app(pool), "GET", "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"]["code"], "shopify_unconfigured");
}

#[sqlx::test(migrations = "../../migrations")]
async fn products_proxies_admin_api(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/admin/api/2024-10/graphql.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"products": {
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "edges": [{"node": {
                    "id": "gid://shopify/Product/8123",
                    "title": "Linen shirt",
                    "createdAt": "2026-09-30T12:00:00Z",
                    "featuredImage": null,
                    "variants": {"edges": [{"node": {"price": "30.00", "compareAtPrice": null}}]}
                }}]
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let credentials = ShopifyCredentials {
        shop_domain: server.uri(),
        admin_token: "shpat_test".to_string(),
        api_version: "2024-10".to_string(),
    };
    let client = AdminClient::new(&credentials, 5, "labelkit-test/0.1", 0, 0).expect("client");
    let app = build_app(
        AppState {
            pool,
            shopify: Some(Arc::new(client)),
        },
        AuthState::disabled(),
        RateLimits::default(),
    );

    let (status, json) = send(app, "GET", "/api/v1/products?first=5&query=linen", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["products"][0]["title"], "Linen shirt");
    assert_eq!(json["data"]["hasNextPage"], false);
}

#[sqlx::test(migrations = "../../migrations")]
async fn products_upstream_failure_is_bad_gateway(pool: PgPool) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let credentials = ShopifyCredentials {
        shop_domain: server.uri(),
        admin_token: "shpat_test".to_string(),
        api_version: "2024-10".to_string(),
    };
    let client = AdminClient::new(&credentials, 5, "labelkit-test/0.1", 0, 0).expect("client");
    let app = build_app(
        AppState {
            pool,
            shopify: Some(Arc::new(client)),
        },
        AuthState::disabled(),
        RateLimits::default(),
    );

    let (status, json) = send(app, "GET", "/api/v1/products", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"]["code"], "upstream_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_rate_limit_returns_429(pool: PgPool) {
    let limits = RateLimits {
        admin: RateLimitState::new("admin", 1, Duration::from_secs(60)),
        ..RateLimits::default()
    };
    let app = build_app(
        AppState {
            pool,
            shopify: None,
        },
        AuthState::disabled(),
        limits,
    );

    let (first, _) = send(app.clone(), "GET", "/api/v1/labels", None).await;
    assert_eq!(first, StatusCode::OK);

    let (second, json) = send(app.clone(), "GET", "/api/v1/labels", None).await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json["error"]["code"], "rate_limited");

    // Storefront has its own window.
    let (storefront, _) = send(app, "GET", "/apps/labels/labels", None).await;
    assert_eq!(storefront, StatusCode::OK);
}
