//! Note domain model.
//!
//! # Responsibility
//! - Define the persisted `Note` record and its JSON representation.
//! - Normalize and validate create/update input before any write.
//!
//! # Invariants
//! - `id` is assigned by the datastore and never reused.
//! - `title` is never empty or whitespace-only after trimming.
//! - `content` is never null; absent content is stored as `""`.
//! - `created_at <= updated_at`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

/// Datastore-assigned note identifier.
pub type NoteId = i64;

/// Maximum title length in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Output format for timestamps: ISO-8601, UTC, no offset, microseconds.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// Persisted note as returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(serialize_with = "serialize_timestamp")]
    pub created_at: NaiveDateTime,
    #[serde(serialize_with = "serialize_timestamp")]
    pub updated_at: NaiveDateTime,
}

/// Create request payload.
///
/// Both fields are optional at the parsing layer so that a missing title is
/// reported as a validation error rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CreateNote {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Partial update payload.
///
/// `None` means "leave unchanged"; `Some("")` is an explicit overwrite.
/// JSON `null` is treated the same as an absent key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct UpdateNote {
    pub title: Option<String>,
    pub content: Option<String>,
}

/// Validated, trimmed input for inserting a new note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    pub title: String,
    pub content: String,
}

/// Validated, trimmed field changes for an existing note.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotePatch {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoteValidationError {
    #[error("title is required")]
    TitleRequired,
    #[error("title is too long")]
    TitleTooLong,
}

impl CreateNote {
    /// Trims both fields and enforces the title invariant.
    pub fn validate(self) -> Result<NoteDraft, NoteValidationError> {
        let title = normalize_title(self.title.as_deref().unwrap_or_default())?;
        let content = self.content.as_deref().unwrap_or_default().trim().to_string();
        Ok(NoteDraft { title, content })
    }
}

impl UpdateNote {
    /// Trims present fields; a present title must still be non-empty.
    pub fn validate(self) -> Result<NotePatch, NoteValidationError> {
        let title = self.title.as_deref().map(normalize_title).transpose()?;
        let content = self.content.map(|value| value.trim().to_string());
        Ok(NotePatch { title, content })
    }
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none()
    }
}

fn normalize_title(raw: &str) -> Result<String, NoteValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(NoteValidationError::TitleRequired);
    }
    if trimmed.chars().count() > TITLE_MAX_CHARS {
        return Err(NoteValidationError::TitleTooLong);
    }
    Ok(trimmed.to_string())
}

/// Converts a stored microsecond epoch value back into a UTC timestamp.
pub fn timestamp_from_micros(micros: i64) -> Option<NaiveDateTime> {
    DateTime::<Utc>::from_timestamp_micros(micros).map(|value| value.naive_utc())
}

/// Converts a UTC timestamp into its stored microsecond epoch value.
pub fn timestamp_to_micros(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}

fn serialize_timestamp<S: Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}
