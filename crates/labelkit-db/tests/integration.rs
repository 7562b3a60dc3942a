//! Offline tests for labelkit-db pool configuration.
//! These tests do not require a live database connection.

use labelkit_core::{AppConfig, Environment};
use labelkit_db::{LabelPatch, PoolConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: Some("postgres://example".to_string()),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        api_keys: vec!["key".to_string()],
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        shopify: None,
        request_timeout_secs: 30,
        user_agent: "ua".to_string(),
        shopify_max_retries: 3,
        shopify_retry_backoff_base_secs: 2,
        label_endpoints: vec!["/apps/labels/labels".to_string()],
        variant_settle_ms: 300,
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[tokio::test]
async fn connect_without_database_url_is_a_typed_error() {
    let mut config = app_config();
    config.database_url = None;
    let err = labelkit_db::connect_pool_from_config(&config)
        .await
        .expect_err("no url");
    assert!(matches!(err, labelkit_db::DbError::MissingDatabaseUrl));
}

#[test]
fn patch_with_only_active_is_not_empty() {
    let patch = LabelPatch {
        active: Some(false),
        ..LabelPatch::default()
    };
    assert!(!patch.is_empty());
}
