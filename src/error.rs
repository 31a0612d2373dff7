use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("Note not found")]
    NotFound,
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),
}

/// One entry of a 422 report: where the bad value sits (`["body", "title"]`)
/// and why it was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(source: &str, field: Option<&str>, msg: impl Into<String>, kind: impl Into<String>) -> Self {
        let mut loc = vec![source.to_string()];
        loc.extend(field.map(ToString::to_string));

        Self {
            loc,
            msg: msg.into(),
            kind: kind.into(),
        }
    }

    /// Flattens `validator` output, sorted by field name so reports are stable.
    pub fn from_validation(source: &str, errors: &ValidationErrors) -> Vec<Self> {
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        fields
            .into_iter()
            .flat_map(|(field, errors)| {
                let field = field.to_string();
                errors.iter().map(move |error| {
                    let msg = error
                        .message
                        .as_ref()
                        .map_or_else(|| format!("invalid value for {field}"), ToString::to_string);
                    Self::new(source, Some(&field), msg, error.code.to_string())
                })
            })
            .collect()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(errors) => {
                (StatusCode::UNPROCESSABLE_ENTITY, Json(json!({ "detail": errors }))).into_response()
            }
            Self::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "detail": "Note not found" }))).into_response()
            }
            Self::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": "Internal Server Error" })),
            )
                .into_response(),
        }
    }
}
