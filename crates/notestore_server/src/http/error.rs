//! Error-status mapping for the HTTP surface.
//!
//! Every failure is rendered as `{"error": "<message>"}` with the status the
//! API contract assigns to it.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use notestore_core::{NoteServiceError, NoteValidationError};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str),
    NotFound,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            Self::BadRequest(message) => message,
            Self::NotFound => "not found",
            Self::Internal => "internal server error",
        }
    }
}

impl From<NoteServiceError> for ApiError {
    fn from(value: NoteServiceError) -> Self {
        match value {
            NoteServiceError::Validation(NoteValidationError::TitleRequired) => {
                Self::BadRequest("title is required")
            }
            NoteServiceError::Validation(NoteValidationError::TitleTooLong) => {
                Self::BadRequest("title is too long")
            }
            NoteServiceError::NotFound(_) => Self::NotFound,
            // Already logged with detail by the service.
            NoteServiceError::DatastoreUnavailable(_) | NoteServiceError::Repo(_) => {
                Self::Internal
            }
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(value: tokio::task::JoinError) -> Self {
        error!("event=blocking_task module=http status=error error={value}");
        Self::Internal
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}
