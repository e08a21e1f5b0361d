use std::sync::Arc;

use anyhow::Context;
use axum::{extract::State, routing::get, Router};
use clap::Parser;
use db_browser::{ApiResponse, DbBrowserLayer, DriverKind};
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Connection details reported by GET /info
#[derive(Debug, Clone, Serialize)]
struct ServerInfo {
    version: &'static str,
    database: DatabaseInfo,
}

#[derive(Debug, Clone, Serialize)]
struct DatabaseInfo {
    #[serde(rename = "type")]
    kind: String,
    host: String,
    port: u16,
    name: String,
    user: String,
}

impl ServerInfo {
    fn new(config: &Config, driver: DriverKind) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseInfo {
                kind: driver.to_string(),
                host: config.db_host.clone(),
                port: config.db_port,
                name: config.db_name.clone(),
                user: config.db_user.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    tracing::debug!(?config, "configuration loaded");

    let driver = config.driver()?;
    let info = Arc::new(ServerInfo::new(&config, driver));

    let browser = match driver {
        DriverKind::Postgres => {
            let pool = PgPoolOptions::new()
                .max_connections(config.max_connections)
                .acquire_timeout(config.acquire_timeout())
                .connect_with(config.connect_options())
                .await
                .with_context(|| {
                    format!(
                        "failed to connect to {}:{}/{}",
                        config.db_host, config.db_port, config.db_name
                    )
                })?;

            DbBrowserLayer::postgres(config.base_path.clone(), pool)
        }
    }
    .with_request_timeout(config.request_timeout())
    .with_query_token(config.query_token.clone());

    if !browser.query_guarded() {
        tracing::warn!("POST /query executes arbitrary SQL without authorization; set QUERY_TOKEN to require a bearer token");
    }

    let app = Router::new()
        .route(&info_path(&config.base_path), get(info_handler))
        .with_state(info)
        .merge(browser.into_router())
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;

    tracing::info!(
        listen = %config.listen,
        database = %format!("{}:{}/{}", config.db_host, config.db_port, config.db_name),
        "db-browser listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// `/info` under the same mount as the browser endpoints
fn info_path(base_path: &str) -> String {
    let base_path = base_path.trim_matches('/');
    if base_path.is_empty() {
        "/info".to_string()
    } else {
        format!("/{}/info", base_path)
    }
}

/// Handler for GET /info
async fn info_handler(State(info): State<Arc<ServerInfo>>) -> ApiResponse<ServerInfo> {
    ApiResponse::success(info.as_ref().clone())
}

/// Resolves on SIGINT (Ctrl+C) or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
