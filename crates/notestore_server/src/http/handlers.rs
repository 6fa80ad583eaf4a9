//! Route handlers. Each one hands the blocking store call to the tokio
//! blocking pool and maps the outcome onto the API contract.

use super::error::ApiError;
use super::extract::{LenientJson, NoteIdPath};
use super::AppState;
use crate::NoteStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use notestore_core::{CreateNote, Note, NoteServiceError, UpdateNote};
use serde_json::{json, Value};

pub async fn status_handler() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn list_notes_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = run_blocking(&state, |store| store.list_notes()).await?;
    Ok(Json(notes))
}

pub async fn create_note_handler(
    State(state): State<AppState>,
    LenientJson(input): LenientJson<CreateNote>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = run_blocking(&state, move |store| store.create_note(input)).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn get_note_handler(
    State(state): State<AppState>,
    NoteIdPath(id): NoteIdPath,
) -> Result<Json<Note>, ApiError> {
    let note = run_blocking(&state, move |store| store.get_note(id)).await?;
    Ok(Json(note))
}

pub async fn update_note_handler(
    State(state): State<AppState>,
    NoteIdPath(id): NoteIdPath,
    LenientJson(input): LenientJson<UpdateNote>,
) -> Result<Json<Note>, ApiError> {
    let note = run_blocking(&state, move |store| store.update_note(id, input)).await?;
    Ok(Json(note))
}

pub async fn delete_note_handler(
    State(state): State<AppState>,
    NoteIdPath(id): NoteIdPath,
) -> Result<Json<Value>, ApiError> {
    run_blocking(&state, move |store| store.delete_note(id)).await?;
    Ok(Json(json!({ "ok": true })))
}

pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&NoteStore) -> Result<T, NoteServiceError> + Send + 'static,
{
    let store = state.store.clone();
    let outcome = tokio::task::spawn_blocking(move || op(store.as_ref())).await?;
    outcome.map_err(ApiError::from)
}
