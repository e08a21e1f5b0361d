//! Server configuration
//!
//! Parsed once at start-up from flags, falling back to environment variables.

use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;

use clap::Parser;
use db_browser::DriverKind;
use sqlx::postgres::{PgConnectOptions, PgSslMode};

/// Default HTTP listen address
const DEFAULT_LISTEN: &str = "0.0.0.0:23806";

/// HTTP API for browsing and editing the tables of a PostgreSQL database
#[derive(Parser, Clone)]
#[command(name = "db-browser-server", version, about)]
pub struct Config {
    /// Database engine.
    #[arg(long, default_value = "postgres", env = "DB_TYPE")]
    pub db_type: String,

    /// Database host.
    #[arg(long, env = "DB_HOST")]
    pub db_host: String,

    /// Database port.
    #[arg(long, default_value_t = 5432, env = "DB_PORT")]
    pub db_port: u16,

    /// Database user.
    #[arg(long, env = "DB_USER")]
    pub db_user: String,

    /// Database password.
    #[arg(long, env = "DB_PASSWORD", hide_env_values = true)]
    pub db_password: String,

    /// Database name.
    #[arg(long, env = "DB_NAME")]
    pub db_name: String,

    /// TLS mode: disable, allow, prefer, require, verify-ca or verify-full.
    #[arg(long, default_value = "disable", value_parser = parse_ssl_mode, env = "SSL_MODE")]
    pub ssl_mode: PgSslMode,

    /// Address for the HTTP server.
    #[arg(long, default_value = DEFAULT_LISTEN, env = "LISTEN_ADDR")]
    pub listen: SocketAddr,

    /// Path the API is mounted under; empty mounts it at the root.
    #[arg(long, default_value = "", env = "BASE_PATH")]
    pub base_path: String,

    /// Maximum pooled database connections.
    #[arg(long, default_value_t = 10, env = "DB_MAX_CONNECTIONS")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection.
    #[arg(long, default_value_t = 30, env = "DB_ACQUIRE_TIMEOUT")]
    pub acquire_timeout: u64,

    /// Seconds a single request may spend on database work.
    #[arg(long, default_value_t = 60, env = "REQUEST_TIMEOUT")]
    pub request_timeout: u64,

    /// Bearer token required by POST /query. Unset leaves it open.
    #[arg(long, env = "QUERY_TOKEN", hide_env_values = true)]
    pub query_token: Option<String>,
}

fn parse_ssl_mode(value: &str) -> Result<PgSslMode, String> {
    value
        .parse()
        .map_err(|_| format!("unknown SSL mode {:?}", value))
}

impl Config {
    /// Resolve the configured engine to a driver
    pub fn driver(&self) -> Result<DriverKind, db_browser::Error> {
        self.db_type.parse()
    }

    /// Connection options for the pool
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.db_host)
            .port(self.db_port)
            .username(&self.db_user)
            .password(&self.db_password)
            .database(&self.db_name)
            .ssl_mode(self.ssl_mode)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("db_type", &self.db_type)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &"<redacted>")
            .field("db_name", &self.db_name)
            .field("ssl_mode", &self.ssl_mode)
            .field("listen", &self.listen)
            .field("base_path", &self.base_path)
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .field("request_timeout", &self.request_timeout)
            .field("query_token", &self.query_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
