use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::Note;

pub const DEFAULT_LIMIT: i64 = 100;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct NoteResponse {
    /// Note ID
    pub id: i64,
    /// Note title
    pub title: String,
    /// Note content
    pub content: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateNoteRequest {
    /// Note title
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    #[schema(min_length = 1, max_length = 255)]
    pub title: String,
    /// Note content
    #[serde(default)]
    pub content: String,
}

/// Partial update. A field left out (or sent as `null`) keeps its stored
/// value; an empty string is a real value and overwrites it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateNoteRequest {
    /// New note title
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    #[schema(min_length = 1, max_length = 255)]
    pub title: Option<String>,
    /// New note content
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    /// Number of records to skip
    #[serde(default)]
    #[validate(range(min = 0, message = "skip must be greater than or equal to 0"))]
    #[param(minimum = 0)]
    pub skip: i64,
    /// Max number of records to return
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 1000, message = "limit must be between 1 and 1000"))]
    #[param(minimum = 1, maximum = 1000)]
    pub limit: i64,
}

const fn default_limit() -> i64 {
    DEFAULT_LIMIT
}

#[derive(Debug, Clone, Copy, Deserialize, Validate, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct NotePath {
    /// Note ID
    #[validate(range(min = 1, message = "id must be greater than or equal to 1"))]
    #[param(minimum = 1)]
    pub id: i64,
}
