//! Note repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide note CRUD statements over the `notes` table.
//! - Keep SQL details inside the core persistence boundary.
//!
//! # Invariants
//! - Every mutating method issues exactly one row-mutating statement.
//! - Id-addressed writes on a missing row return `RepoError::NotFound`.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::note::{
    timestamp_from_micros, timestamp_to_micros, Note, NoteDraft, NoteId, NotePatch,
};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;

const NOTE_COLUMNS: &str = "id, title, content, created_at, updated_at";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for note persistence and query operations.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("note not found: {0}")]
    NotFound(NoteId),
    #[error("invalid persisted note data: {0}")]
    InvalidData(String),
    #[error("required table `{0}` is missing")]
    MissingRequiredTable(&'static str),
    #[error("required column `{table}.{column}` is missing")]
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface for note CRUD operations.
pub trait NoteRepository {
    /// Inserts one note and returns the stored row, id included.
    fn insert_note(&self, draft: &NoteDraft, now: NaiveDateTime) -> RepoResult<Note>;
    /// Gets one note by id.
    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>>;
    /// Lists all notes, newest `created_at` first.
    fn list_notes(&self) -> RepoResult<Vec<Note>>;
    /// Applies present patch fields and resets `updated_at`.
    fn update_note(&self, id: NoteId, patch: &NotePatch, now: NaiveDateTime) -> RepoResult<Note>;
    /// Permanently removes one note.
    fn delete_note(&self, id: NoteId) -> RepoResult<()>;
}

/// SQLite-backed note repository.
///
/// Borrows a connection; pass a `Transaction` to scope statements to a
/// unit-of-work.
pub struct SqliteNoteRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNoteRepository<'conn> {
    /// Wraps a connection opened on a bootstrapped datastore.
    ///
    /// Issues no statements, so a unit-of-work's first query is its own.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Constructs a repository after checking the `notes` table and columns.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_note_connection_ready(conn)?;
        Ok(Self::new(conn))
    }
}

impl NoteRepository for SqliteNoteRepository<'_> {
    fn insert_note(&self, draft: &NoteDraft, now: NaiveDateTime) -> RepoResult<Note> {
        let stamp = timestamp_to_micros(now);
        let note = self.conn.query_row(
            &format!(
                "INSERT INTO notes (title, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?3)
                 RETURNING {NOTE_COLUMNS};"
            ),
            params![draft.title.as_str(), draft.content.as_str(), stamp],
            parse_note_row,
        )??;
        Ok(note)
    }

    fn get_note(&self, id: NoteId) -> RepoResult<Option<Note>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {NOTE_COLUMNS} FROM notes WHERE id = ?1;"),
                [id],
                parse_note_row,
            )
            .optional()?;
        row.transpose()
    }

    fn list_notes(&self) -> RepoResult<Vec<Note>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {NOTE_COLUMNS}
             FROM notes
             ORDER BY created_at DESC, id DESC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut notes = Vec::new();
        while let Some(row) = rows.next()? {
            notes.push(parse_note_row(row)??);
        }
        Ok(notes)
    }

    fn update_note(&self, id: NoteId, patch: &NotePatch, now: NaiveDateTime) -> RepoResult<Note> {
        // `max` keeps `created_at <= updated_at` even if the wall clock moved back.
        let row = self
            .conn
            .query_row(
                &format!(
                    "UPDATE notes
                     SET
                        title = COALESCE(?2, title),
                        content = COALESCE(?3, content),
                        updated_at = max(?4, created_at)
                     WHERE id = ?1
                     RETURNING {NOTE_COLUMNS};"
                ),
                params![
                    id,
                    patch.title.as_deref(),
                    patch.content.as_deref(),
                    timestamp_to_micros(now),
                ],
                parse_note_row,
            )
            .optional()?;

        match row {
            Some(note) => note,
            None => Err(RepoError::NotFound(id)),
        }
    }

    fn delete_note(&self, id: NoteId) -> RepoResult<()> {
        let changed = self.conn.execute("DELETE FROM notes WHERE id = ?1;", [id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

/// Row mapper; the outer result carries SQLite errors, the inner one data errors.
fn parse_note_row(row: &Row<'_>) -> rusqlite::Result<RepoResult<Note>> {
    let id: NoteId = row.get("id")?;
    let created_at: i64 = row.get("created_at")?;
    let updated_at: i64 = row.get("updated_at")?;
    let title: String = row.get("title")?;
    let content: Option<String> = row.get("content")?;

    let (Some(created_at), Some(updated_at)) = (
        timestamp_from_micros(created_at),
        timestamp_from_micros(updated_at),
    ) else {
        return Ok(Err(RepoError::InvalidData(format!(
            "note {id} has out-of-range timestamps"
        ))));
    };

    Ok(Ok(Note {
        id,
        title,
        content: content.unwrap_or_default(),
        created_at,
        updated_at,
    }))
}

fn ensure_note_connection_ready(conn: &Connection) -> RepoResult<()> {
    if !table_exists(conn, "notes")? {
        return Err(RepoError::MissingRequiredTable("notes"));
    }

    for column in ["id", "title", "content", "created_at", "updated_at"] {
        if !table_has_column(conn, "notes", column)? {
            return Err(RepoError::MissingRequiredColumn {
                table: "notes",
                column,
            });
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
