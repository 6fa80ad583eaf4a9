//! Note use-case service.
//!
//! # Responsibility
//! - Provide note list/create/get/update/delete APIs to the front door.
//! - Validate input before any write.
//! - Scope each call to exactly one unit-of-work.
//!
//! # Invariants
//! - Every call opens its own session and releases it on every exit path.
//! - A unit-of-work is committed only after all of its statements succeed.
//! - Writes take the database write lock when their transaction begins, so
//!   overlapping writers wait on `busy_timeout` instead of failing.
//! - Any successful update resets `updated_at`, even when nothing changed.
//! - Concurrent updates of one note are last-writer-wins.

use crate::db::{DbError, SessionFactory};
use crate::model::note::{CreateNote, Note, NoteId, NoteValidationError, UpdateNote};
use crate::repo::note_repo::{NoteRepository, RepoError, SqliteNoteRepository};
use chrono::{NaiveDateTime, Utc};
use log::{debug, error, info};
use rusqlite::TransactionBehavior;
use std::time::Instant;
use thiserror::Error;

/// Service error for note use-cases.
#[derive(Debug, Error)]
pub enum NoteServiceError {
    /// Client input failed a precondition.
    #[error(transparent)]
    Validation(#[from] NoteValidationError),
    /// Target note does not exist.
    #[error("note not found: {0}")]
    NotFound(NoteId),
    /// A session could not be opened.
    #[error("datastore unavailable: {0}")]
    DatastoreUnavailable(#[source] DbError),
    /// Persistence-layer failure inside an open session.
    #[error(transparent)]
    Repo(RepoError),
}

impl From<RepoError> for NoteServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<rusqlite::Error> for NoteServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::from(value))
    }
}

impl NoteServiceError {
    /// Stable short code used in log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound(_) => "not_found",
            Self::DatastoreUnavailable(_) => "db_unavailable",
            Self::Repo(_) => "db_error",
        }
    }
}

/// Source of "now" for note timestamps.
pub trait Clock: Send + Sync {
    /// Current UTC time.
    fn now(&self) -> NaiveDateTime;
}

/// Wall-clock UTC time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Note service facade over an injected session factory.
pub struct NoteService<F: SessionFactory, C: Clock = SystemClock> {
    sessions: F,
    clock: C,
}

impl<F: SessionFactory> NoteService<F> {
    /// Creates a service using the wall clock.
    pub fn new(sessions: F) -> Self {
        Self::with_clock(sessions, SystemClock)
    }
}

impl<F: SessionFactory, C: Clock> NoteService<F, C> {
    /// Creates a service with an explicit clock.
    pub fn with_clock(sessions: F, clock: C) -> Self {
        Self { sessions, clock }
    }

    /// Lists every note, newest first. An empty store yields an empty vec.
    pub fn list_notes(&self) -> Result<Vec<Note>, NoteServiceError> {
        self.unit_of_work("note_list", TransactionBehavior::Deferred, |repo| {
            Ok(repo.list_notes()?)
        })
    }

    /// Creates one note from trimmed input.
    ///
    /// # Errors
    /// - `Validation` when the trimmed title is empty; nothing is written.
    pub fn create_note(&self, input: CreateNote) -> Result<Note, NoteServiceError> {
        let draft = input.validate()?;
        let now = self.clock.now();
        self.unit_of_work("note_create", TransactionBehavior::Immediate, |repo| {
            Ok(repo.insert_note(&draft, now)?)
        })
    }

    /// Gets one note by id.
    pub fn get_note(&self, id: NoteId) -> Result<Note, NoteServiceError> {
        self.unit_of_work("note_get", TransactionBehavior::Deferred, |repo| {
            repo.get_note(id)?.ok_or(NoteServiceError::NotFound(id))
        })
    }

    /// Applies a partial update and returns the post-update note.
    ///
    /// Absent fields stay untouched; `updated_at` is always reset.
    ///
    /// # Errors
    /// - `NotFound` when `id` does not exist, whatever the payload holds.
    /// - `Validation` when a present title trims to empty; nothing is written.
    pub fn update_note(&self, id: NoteId, input: UpdateNote) -> Result<Note, NoteServiceError> {
        let now = self.clock.now();
        self.unit_of_work("note_update", TransactionBehavior::Immediate, |repo| {
            if repo.get_note(id)?.is_none() {
                return Err(NoteServiceError::NotFound(id));
            }
            let patch = input.validate()?;
            Ok(repo.update_note(id, &patch, now)?)
        })
    }

    /// Permanently deletes one note.
    pub fn delete_note(&self, id: NoteId) -> Result<(), NoteServiceError> {
        self.unit_of_work("note_delete", TransactionBehavior::Immediate, |repo| {
            Ok(repo.delete_note(id)?)
        })
    }

    /// Runs `op` inside a fresh session and transaction.
    ///
    /// Reads use `Deferred`; writes use `Immediate` so the lock is taken up
    /// front rather than upgraded from a shared lock mid-transaction.
    ///
    /// The transaction is committed only when `op` succeeds; otherwise it is
    /// rolled back on drop. The connection is released when this returns.
    fn unit_of_work<T>(
        &self,
        event: &'static str,
        behavior: TransactionBehavior,
        op: impl FnOnce(&SqliteNoteRepository<'_>) -> Result<T, NoteServiceError>,
    ) -> Result<T, NoteServiceError> {
        let started_at = Instant::now();
        let result = self.run_unit_of_work(behavior, op);
        let duration_ms = started_at.elapsed().as_millis();
        match &result {
            Ok(_) => info!("event={event} module=service status=ok duration_ms={duration_ms}"),
            Err(err @ (NoteServiceError::Validation(_) | NoteServiceError::NotFound(_))) => {
                debug!(
                    "event={event} module=service status=rejected duration_ms={duration_ms} error_code={}",
                    err.code()
                )
            }
            Err(err) => error!(
                "event={event} module=service status=error duration_ms={duration_ms} error_code={} error={}",
                err.code(),
                err
            ),
        }
        result
    }

    fn run_unit_of_work<T>(
        &self,
        behavior: TransactionBehavior,
        op: impl FnOnce(&SqliteNoteRepository<'_>) -> Result<T, NoteServiceError>,
    ) -> Result<T, NoteServiceError> {
        let mut conn = self
            .sessions
            .open_session()
            .map_err(NoteServiceError::DatastoreUnavailable)?;
        let tx = conn.transaction_with_behavior(behavior)?;
        let repo = SqliteNoteRepository::new(&tx);
        let value = op(&repo)?;
        tx.commit()?;
        Ok(value)
    }
}
