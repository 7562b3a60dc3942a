use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Admin API credentials for the single store this deployment serves.
#[derive(Clone)]
pub struct ShopifyCredentials {
    /// e.g. `"my-shop.myshopify.com"`; a full `https://` origin is also accepted.
    pub shop_domain: String,
    pub admin_token: String,
    pub api_version: String,
}

impl std::fmt::Debug for ShopifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyCredentials")
            .field("shop_domain", &self.shop_domain)
            .field("admin_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Only the server needs a database; the CLI runs without one.
    pub database_url: Option<String>,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_keys: Vec<String>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub shopify: Option<ShopifyCredentials>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_secs: u64,
    pub label_endpoints: Vec<String>,
    pub variant_settle_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("shopify", &self.shopify)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_secs",
                &self.shopify_retry_backoff_base_secs,
            )
            .field("label_endpoints", &self.label_endpoints)
            .field("variant_settle_ms", &self.variant_settle_ms)
            .finish()
    }
}
