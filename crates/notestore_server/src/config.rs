//! Deployment configuration for the HTTP front door.
//!
//! # Responsibility
//! - Read listen address, datastore URL, CORS origins and logging options
//!   from command-line flags, falling back to environment variables.
//! - Build the CORS layer applied to `/api/*`.
//!
//! # Invariants
//! - None of these settings change note semantics.
//! - An empty `DATABASE_URL` falls back to the default datastore.

use axum::http::{header, HeaderValue, Method};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;
use tower_http::cors::{AllowOrigin, CorsLayer};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://notes.db";
pub const DEFAULT_PORT: u16 = 5000;
const ANY_ORIGIN: &str = "*";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid allowed origin `{0}`")]
    InvalidOrigin(String),
}

/// Server settings; every flag can also be supplied through its env var.
#[derive(Debug, Clone, Parser)]
#[command(name = "notestore-server", version, about = "HTTP/JSON note store")]
pub struct ServerConfig {
    /// Datastore location (`sqlite://path`, `sqlite:path` or a file path).
    #[arg(long, env = "DATABASE_URL", default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    /// Interface to bind.
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Comma-separated origins allowed to call `/api/*`; `*` allows any.
    #[arg(
        long,
        env = "ALLOWED_ORIGINS",
        default_value = ANY_ORIGIN,
        value_delimiter = ','
    )]
    pub allowed_origins: Vec<String>,

    /// Verbose logging.
    #[arg(
        long,
        env = "DEBUG",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub debug: bool,

    /// Log level when `--debug` is off.
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Absolute directory for rotated log files; stderr when unset.
    #[arg(long, env = "LOG_DIR")]
    pub log_dir: Option<String>,

    /// Report the first `X-Forwarded-For` hop as the client address.
    #[arg(
        long,
        env = "TRUST_PROXY",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new()
    )]
    pub trust_proxy: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            allowed_origins: vec![ANY_ORIGIN.to_string()],
            debug: false,
            log_level: "info".to_string(),
            log_dir: None,
            trust_proxy: false,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Database URL with the empty-value fallback applied.
    pub fn database_url(&self) -> &str {
        let trimmed = self.database_url.trim();
        if trimmed.is_empty() {
            DEFAULT_DATABASE_URL
        } else {
            trimmed
        }
    }

    pub fn effective_log_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            self.log_level.as_str()
        }
    }

    /// Normalized origin list; empty input means any origin.
    pub fn origins(&self) -> Vec<&str> {
        let origins: Vec<&str> = self
            .allowed_origins
            .iter()
            .map(|origin| origin.trim())
            .filter(|origin| !origin.is_empty())
            .collect();
        if origins.is_empty() {
            vec![ANY_ORIGIN]
        } else {
            origins
        }
    }

    pub fn cors_layer(&self) -> Result<CorsLayer, ConfigError> {
        let origins = self.origins();
        let allow_origin = if origins.contains(&ANY_ORIGIN) {
            AllowOrigin::any()
        } else {
            let values = origins
                .into_iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .map_err(|_| ConfigError::InvalidOrigin(origin.to_string()))
                })
                .collect::<Result<Vec<_>, _>>()?;
            AllowOrigin::list(values)
        };

        Ok(CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE]))
    }
}
