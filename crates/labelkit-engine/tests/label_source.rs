//! Integration tests for `LabelSourceClient`.
//!
//! Each test stands up a `wiremock` server so endpoint ordering, fallback,
//! and relative-URL resolution are exercised over real HTTP.

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use labelkit_engine::{LabelSourceClient, MemoryObserver};

fn test_client(endpoints: Vec<String>) -> LabelSourceClient {
    LabelSourceClient::new(endpoints, 5, "labelkit-test/0.1")
        .expect("failed to build test LabelSourceClient")
}

fn sale_label() -> serde_json::Value {
    json!({
        "id": "gid://labels/1",
        "text": "Sale",
        "background": "#e11d48",
        "position": "top-right",
        "condition": "rule_based",
        "ruleType": "special_price",
        "ruleConfig": "{\"from\":\"10\",\"to\":\"50\"}",
        "active": true
    })
}

#[tokio::test]
async fn first_successful_endpoint_wins() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sale_label()])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let client = test_client(vec![
        format!("{}/primary", server.uri()),
        format!("{}/secondary", server.uri()),
    ]);
    let observer = MemoryObserver::new();
    let labels = client
        .fetch_labels("https://shop.example/collections/all", &observer)
        .await;

    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].text, "Sale");
    assert_eq!(
        labels[0].rule_config,
        Some(json!({"from": "10", "to": "50"})),
        "stringified rule config is unwrapped"
    );
    assert!(observer.failures().is_empty());
}

#[tokio::test]
async fn falls_back_after_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/primary"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/secondary"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sale_label()])))
        .mount(&server)
        .await;

    let client = test_client(vec![
        format!("{}/primary", server.uri()),
        format!("{}/secondary", server.uri()),
    ]);
    let observer = MemoryObserver::new();
    let labels = client
        .fetch_labels("https://shop.example/", &observer)
        .await;

    assert_eq!(labels.len(), 1);
    let failures = observer.failures();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].0.ends_with("/primary"));
    assert!(failures[0].1.contains("500"));
}

#[tokio::test]
async fn falls_back_when_body_is_not_a_label_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"labels": [sale_label()]})),
        )
        .mount(&server)
        .await;

    let client = test_client(vec![
        format!("{}/html", server.uri()),
        format!("{}/json", server.uri()),
    ]);
    let observer = MemoryObserver::new();
    let labels = client.fetch_labels("https://shop.example/", &observer).await;

    assert_eq!(labels.len(), 1);
    assert_eq!(observer.failures().len(), 1);
}

#[tokio::test]
async fn relative_endpoint_resolves_against_page_origin() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/apps/labels/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([sale_label()])))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(vec!["/apps/labels/labels".to_string()]);
    let page_url = format!("{}/collections/summer?page=2", server.uri());
    let labels = client
        .fetch_labels(&page_url, &MemoryObserver::new())
        .await;

    assert_eq!(labels.len(), 1);
}

#[tokio::test]
async fn all_endpoints_failing_yields_empty_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = test_client(vec![
        format!("{}/a", server.uri()),
        format!("{}/b", server.uri()),
        "/c".to_string(),
    ]);
    let observer = MemoryObserver::new();
    // The page URL is not a valid base, so "/c" fails before any request.
    let labels = client.fetch_labels("about-blank", &observer).await;

    assert!(labels.is_empty());
    let failures = observer.failures();
    assert_eq!(failures.len(), 3);
    assert!(failures[2].1.contains("invalid label endpoint"));
}

#[tokio::test]
async fn malformed_entries_do_not_poison_the_list() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/labels"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            sale_label(),
            "not a label",
            {"id": 2, "text": "New", "active": "false"}
        ])))
        .mount(&server)
        .await;

    let client = test_client(vec![format!("{}/labels", server.uri())]);
    let labels = client
        .fetch_labels("https://shop.example/", &MemoryObserver::new())
        .await;

    assert_eq!(labels.len(), 2);
    assert_eq!(labels[1].id, "2");
    assert!(!labels[1].active);
}
