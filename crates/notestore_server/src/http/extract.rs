//! Request extractors with the note API's rejection rules.

use super::error::ApiError;
use axum::async_trait;
use axum::body::Bytes;
use axum::extract::{FromRequest, FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use notestore_core::NoteId;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON body that tolerates a missing or malformed payload.
///
/// A request without a JSON `Content-Type` is treated as an empty object and
/// its body is not read. Empty, unparseable, or non-object JSON bodies decode
/// as `T::default()`. An object whose fields have the wrong type is a 400.
#[derive(Debug)]
pub struct LenientJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for LenientJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !has_json_content_type(req.headers()) {
            return Ok(LenientJson(T::default()));
        }
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|_| ApiError::BadRequest("invalid request body"))?;
        decode_lenient(&bytes).map(LenientJson)
    }
}

/// `application/json` or any `application/*+json`, parameters ignored.
fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(mime) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
    else {
        return false;
    };
    let mime = mime.trim().to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

pub(crate) fn decode_lenient<T>(bytes: &[u8]) -> Result<T, ApiError>
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value @ Value::Object(_)) => serde_json::from_value(value)
            .map_err(|_| ApiError::BadRequest("invalid request body")),
        _ => Ok(T::default()),
    }
}

/// Integer `{id}` path segment; anything else is a 404.
#[derive(Debug, Clone, Copy)]
pub struct NoteIdPath(pub NoteId);

#[async_trait]
impl<S> FromRequestParts<S> for NoteIdPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<NoteId>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::NotFound)?;
        Ok(Self(id))
    }
}
