use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_macros::debug_handler;
use serde_json::json;
use utoipa::OpenApi;

use std::sync::Arc;

use crate::{
    dto::{CreateNoteRequest, NotePath, NoteResponse, Pagination, UpdateNoteRequest},
    error::AppError,
    handlers::extract::{ValidatedJson, ValidatedPath, ValidatedQuery},
    service::NoteService,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Notes Backend API",
        description = "CRUD operations for personal notes with SQLite persistence."
    ),
    paths(
        health_check,
        create_note,
        get_all_notes,
        get_one_note,
        update_note,
        delete_note
    ),
    components(schemas(NoteResponse, CreateNoteRequest, UpdateNoteRequest)),
    tags(
        (name = "health", description = "Service health checks"),
        (name = "notes", description = "Operations on notes")
    )
)]
pub struct ApiDoc;

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service is running")
    ),
    tag = "health"
)]
pub async fn health_check() -> Response {
    (StatusCode::OK, Json(json!({ "message": "Healthy" }))).into_response()
}

#[utoipa::path(
    post,
    path = "/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    ValidatedJson(payload): ValidatedJson<CreateNoteRequest>,
) -> Response {
    match service.create_note(payload).await {
        Ok(note) => (StatusCode::CREATED, Json(note)).into_response(),
        Err(e) => {
            tracing::error!("failed to create note entry: {}", e);
            AppError::from(e).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes",
    params(Pagination),
    responses(
        (status = 200, description = "Page of notes", body = Vec<NoteResponse>),
        (status = 422, description = "Pagination out of bounds"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_all_notes(
    State(service): State<Arc<NoteService>>,
    ValidatedQuery(page): ValidatedQuery<Pagination>,
) -> Response {
    match service.get_all_notes(page).await {
        Ok(notes) => (StatusCode::OK, Json(notes)).into_response(),
        Err(e) => {
            tracing::error!("failed to get note entries: {}", e);
            AppError::from(e).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/notes/{id}",
    params(NotePath),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 404, description = "Note not found"),
        (status = 422, description = "Invalid note ID"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn get_one_note(
    State(service): State<Arc<NoteService>>,
    ValidatedPath(path): ValidatedPath<NotePath>,
) -> Response {
    match service.get_one_note(path.id).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to get note entry: {}", e);
            AppError::from(e).into_response()
        }
    }
}

#[utoipa::path(
    put,
    path = "/notes/{id}",
    params(NotePath),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Note not found"),
        (status = 422, description = "Validation error"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    ValidatedPath(path): ValidatedPath<NotePath>,
    ValidatedJson(payload): ValidatedJson<UpdateNoteRequest>,
) -> Response {
    match service.update_note(path.id, payload).await {
        Ok(Some(note)) => (StatusCode::OK, Json(note)).into_response(),
        Ok(None) => AppError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to update note entry: {}", e);
            AppError::from(e).into_response()
        }
    }
}

#[utoipa::path(
    delete,
    path = "/notes/{id}",
    params(NotePath),
    responses(
        (status = 204, description = "Note deleted successfully"),
        (status = 404, description = "Note not found"),
        (status = 422, description = "Invalid note ID"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notes"
)]
#[debug_handler]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    ValidatedPath(path): ValidatedPath<NotePath>,
) -> Response {
    match service.delete_note(path.id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => AppError::NotFound.into_response(),
        Err(e) => {
            tracing::error!("failed to delete note entry: {}", e);
            AppError::from(e).into_response()
        }
    }
}
