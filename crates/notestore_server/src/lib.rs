//! HTTP/JSON front door for the note store.
//!
//! # Responsibility
//! - Turn deployment configuration into a ready-to-serve router.
//! - Keep transport concerns (routing, CORS, status codes) out of
//!   `notestore_core`.

pub mod config;
pub mod http;

pub use config::{ConfigError, ServerConfig};
pub use http::{build_router, AppState};

use notestore_core::{DbError, NoteService, SqliteSessionFactory};
use thiserror::Error;

/// Note service wired to the SQLite session factory.
pub type NoteStore = NoteService<SqliteSessionFactory>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "failed to connect to database `{url}`; ensure it is reachable and DATABASE_URL is correct: {source}"
    )]
    DatastoreUnavailable {
        url: String,
        #[source]
        source: DbError,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Connects the datastore and assembles the router.
///
/// # Errors
/// - `DatastoreUnavailable` when the database cannot be opened or migrated;
///   the process must not start serving in that case.
/// - `Config` for an invalid CORS origin list.
pub fn build_app(config: &ServerConfig) -> Result<axum::Router, StartupError> {
    let url = config.database_url();
    let sessions = SqliteSessionFactory::connect(url).map_err(|source| {
        StartupError::DatastoreUnavailable {
            url: url.to_string(),
            source,
        }
    })?;
    let cors = config.cors_layer()?;
    let state = AppState::new(NoteService::new(sessions), config.trust_proxy);
    Ok(build_router(state, cors))
}
