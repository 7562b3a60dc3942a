use crate::app_config::{AppConfig, Environment, ShopifyCredentials};
use crate::ConfigError;

const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-10";
const DEFAULT_LABEL_ENDPOINT: &str = "/apps/labels/labels";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive this with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let database_url = optional("DATABASE_URL");
    let env = parse_environment(&or_default("LABELKIT_ENV", "development"))?;

    let bind_addr = parse_addr("LABELKIT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("LABELKIT_LOG_LEVEL", "info");
    let api_keys = parse_list(&or_default("LABELKIT_API_KEYS", ""));

    let db_max_connections = parse_u32("LABELKIT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("LABELKIT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("LABELKIT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    // Both halves of the credential pair must be present; a lone domain or
    // token is a misconfiguration rather than "feature off".
    let shopify = match (optional("SHOPIFY_SHOP_DOMAIN"), optional("SHOPIFY_ADMIN_TOKEN")) {
        (Some(shop_domain), Some(admin_token)) => Some(ShopifyCredentials {
            shop_domain,
            admin_token,
            api_version: or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
        }),
        (None, None) => None,
        (Some(_), None) => return Err(ConfigError::MissingEnvVar("SHOPIFY_ADMIN_TOKEN".into())),
        (None, Some(_)) => return Err(ConfigError::MissingEnvVar("SHOPIFY_SHOP_DOMAIN".into())),
    };

    let request_timeout_secs = parse_u64("LABELKIT_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("LABELKIT_USER_AGENT", "labelkit/0.1 (storefront-labels)");
    let shopify_max_retries = parse_u32("LABELKIT_SHOPIFY_MAX_RETRIES", "3")?;
    let shopify_retry_backoff_base_secs =
        parse_u64("LABELKIT_SHOPIFY_RETRY_BACKOFF_BASE_SECS", "2")?;

    let label_endpoints = parse_list(&or_default(
        "LABELKIT_LABEL_ENDPOINTS",
        DEFAULT_LABEL_ENDPOINT,
    ));
    if label_endpoints.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "LABELKIT_LABEL_ENDPOINTS".to_string(),
            reason: "at least one endpoint is required".to_string(),
        });
    }
    let variant_settle_ms = parse_u64("LABELKIT_VARIANT_SETTLE_MS", "300")?;

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        api_keys,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        shopify,
        request_timeout_secs,
        user_agent,
        shopify_max_retries,
        shopify_retry_backoff_base_secs,
        label_endpoints,
        variant_settle_ms,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "LABELKIT_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

/// Splits a comma-separated variable, dropping blank entries.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
