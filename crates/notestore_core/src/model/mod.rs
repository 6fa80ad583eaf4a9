//! Domain model for the note store.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Own input normalization so every write path shares one rule set.
//!
//! # Invariants
//! - Every note is identified by a datastore-assigned `NoteId`.
//! - Deletion is a hard delete; there are no tombstones.

pub mod note;
