//! Core domain logic for the note store.
//! This crate is the single source of truth for note invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{DbError, SessionFactory, SqliteSessionFactory};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::note::{
    CreateNote, Note, NoteDraft, NoteId, NotePatch, NoteValidationError, UpdateNote,
};
pub use repo::note_repo::{NoteRepository, RepoError, RepoResult, SqliteNoteRepository};
pub use service::note_service::{Clock, NoteService, NoteServiceError, SystemClock};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
