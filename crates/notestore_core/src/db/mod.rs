//! SQLite storage bootstrap, schema migration and session entry points.
//!
//! # Responsibility
//! - Open and configure SQLite connections for the note store.
//! - Bring the `notes` schema to the version this build understands.
//! - Hand out one connection per unit-of-work through [`SessionFactory`].
//!
//! # Invariants
//! - Schema version is tracked via `PRAGMA user_version`.
//! - Core code must not read/write note data before the schema upgrade succeeds.

use thiserror::Error;

mod open;
mod schema;
mod session;

pub use open::{open_db, open_db_in_memory};
pub use schema::SCHEMA_VERSION;
pub use session::{parse_database_url, SessionFactory, SqliteSessionFactory};

pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
    #[error("invalid database url `{url}`: {reason}")]
    InvalidDatabaseUrl { url: String, reason: &'static str },
    #[error("schema step {version} failed: {source}")]
    SchemaStep {
        version: u32,
        source: rusqlite::Error,
    },
}
