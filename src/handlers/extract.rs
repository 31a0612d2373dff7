//! Extractors that reject bad input with a 422 field report before a
//! handler body ever runs.

use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::{AppError, FieldError};

/// JSON body that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

/// Query string that has passed its `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedQuery<T>(pub T);

/// Path parameters that have passed their `validator` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedPath<T>(pub T);

fn validated<T: Validate>(source: &str, value: T) -> Result<T, AppError> {
    value
        .validate()
        .map_err(|errors| AppError::Validation(FieldError::from_validation(source, &errors)))?;

    Ok(value)
}

fn rejected(source: &str, body_text: String) -> AppError {
    AppError::Validation(vec![FieldError::new(source, None, body_text, "parse")])
}

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| rejected("body", rejection.body_text()))?;

        validated("body", value).map(Self)
    }
}

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejected("query", rejection.body_text()))?;

        validated("query", value).map(Self)
    }
}

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Validate + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| rejected("path", rejection.body_text()))?;

        validated("path", value).map(Self)
    }
}
