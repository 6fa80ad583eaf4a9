//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes receive already-validated input (`NoteDraft`, `NotePatch`).
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod note_repo;
