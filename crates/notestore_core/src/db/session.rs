//! Per-request session (unit-of-work) factory.
//!
//! # Responsibility
//! - Resolve a database URL into a SQLite file location.
//! - Bootstrap the schema once, then open one fresh connection per session.
//!
//! # Invariants
//! - A factory only exists for a datastore that was reachable and migrated.
//! - Sessions never share a connection; dropping the connection releases it.

use super::open::{configure_connection, open_db};
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

/// Produces one datastore connection per unit-of-work.
pub trait SessionFactory: Send + Sync {
    /// Opens a connection scoped to a single unit-of-work.
    fn open_session(&self) -> DbResult<Connection>;
}

/// File-backed SQLite session factory.
#[derive(Debug, Clone)]
pub struct SqliteSessionFactory {
    path: PathBuf,
}

impl SqliteSessionFactory {
    /// Connects to the datastore behind `database_url` and upgrades the schema.
    ///
    /// # Errors
    /// - `InvalidDatabaseUrl` for unsupported schemes or in-memory targets.
    /// - Any open or schema failure; callers treat this as fatal at startup.
    pub fn connect(database_url: &str) -> DbResult<Self> {
        let path = parse_database_url(database_url)?;
        Self::bootstrap(path)
    }

    /// Bootstraps a factory for a database file path.
    pub fn bootstrap(path: impl Into<PathBuf>) -> DbResult<Self> {
        let path = path.into();
        let conn = open_db(&path)?;
        drop(conn);
        info!(
            "event=session_factory_ready module=db status=ok path={}",
            path.display()
        );
        Ok(Self { path })
    }

    /// Database file backing this factory.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionFactory for SqliteSessionFactory {
    fn open_session(&self) -> DbResult<Connection> {
        // The file must already exist: sessions never recreate a missing schema.
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&self.path, flags).map_err(|err| {
            error!(
                "event=session_open module=db status=error error_code=db_unavailable error={}",
                err
            );
            DbError::from(err)
        })?;
        configure_connection(&conn)?;
        Ok(conn)
    }
}

/// Resolves `sqlite://path`, `sqlite:path` or a bare path into a file path.
///
/// In-memory targets are rejected: every session opens its own connection,
/// so each would see a different empty database.
pub fn parse_database_url(database_url: &str) -> DbResult<PathBuf> {
    let trimmed = database_url.trim();
    let invalid = |reason: &'static str| DbError::InvalidDatabaseUrl {
        url: trimmed.to_string(),
        reason,
    };

    if trimmed.is_empty() {
        return Err(invalid("database url cannot be empty"));
    }

    let location = match trimmed.split_once("://") {
        Some(("sqlite", rest)) => rest,
        Some((_, _)) => return Err(invalid("only sqlite urls are supported")),
        None => trimmed.strip_prefix("sqlite:").unwrap_or(trimmed),
    };

    if location.is_empty() {
        return Err(invalid("database path cannot be empty"));
    }
    if location == ":memory:" || location.starts_with("file::memory:") {
        return Err(invalid("in-memory databases cannot be shared between sessions"));
    }

    Ok(PathBuf::from(location))
}
