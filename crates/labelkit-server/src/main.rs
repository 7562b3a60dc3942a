mod api;
mod middleware;

use std::sync::Arc;

use labelkit_shopify::AdminClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, AppState, RateLimits},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = labelkit_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool = labelkit_db::connect_pool_from_config(&config).await?;
    let applied = labelkit_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let shopify = match &config.shopify {
        Some(credentials) => {
            let client = AdminClient::new(
                credentials,
                config.request_timeout_secs,
                &config.user_agent,
                config.shopify_max_retries,
                config.shopify_retry_backoff_base_secs,
            )?;
            tracing::info!(endpoint = client.endpoint(), "shopify admin client ready");
            Some(Arc::new(client))
        }
        None => {
            tracing::warn!("shopify credentials not configured; product search disabled");
            None
        }
    };

    let auth = AuthState::from_keys(
        &config.api_keys,
        matches!(config.env, labelkit_core::Environment::Development),
    )?;
    let app = build_app(AppState { pool, shopify }, auth, RateLimits::default());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, env = %config.env, "labelkit-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
