//! Notes schema versioning.
//!
//! # Invariants
//! - `PRAGMA user_version` equals the number of schema steps applied.
//! - Pending steps run in one write transaction; a failed step leaves the
//!   file at its previous version.

use super::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

const SCHEMA_STEPS: [&str; 1] = [include_str!("schema/0001_notes.sql")];

/// Schema version this build creates and understands.
pub const SCHEMA_VERSION: u32 = SCHEMA_STEPS.len() as u32;

/// Brings the database up to [`SCHEMA_VERSION`] and returns the version it
/// found on entry.
///
/// The version is read under the write lock so two processes bootstrapping
/// the same file cannot both apply a step.
pub(crate) fn upgrade_schema(conn: &mut Connection) -> DbResult<u32> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let found: u32 = tx.pragma_query_value(None, "user_version", |row| row.get(0))?;
    if found > SCHEMA_VERSION {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: SCHEMA_VERSION,
        });
    }

    for (version, sql) in (1..).zip(SCHEMA_STEPS).skip(found as usize) {
        tx.execute_batch(sql)
            .map_err(|source| DbError::SchemaStep { version, source })?;
        tx.pragma_update(None, "user_version", version)?;
        info!("event=db_schema_step module=db status=ok version={version}");
    }
    tx.commit()?;
    Ok(found)
}
