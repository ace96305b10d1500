//! Request extractors.

use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::AppError;

/// JSON body that has been deserialized and passed its `Validate` rules.
///
/// Malformed bodies are rejected as `bad_request`, rule violations as
/// `validation_error`, both with status 400.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::bad_request(rejection.body_text()))?;

        value.validate()?;

        Ok(Self(value))
    }
}

/// Path parameters in the `AppError` envelope.
///
/// A segment that does not parse (e.g. `/books/abc` for an `i64` id) is
/// `bad_request` instead of axum's plain-text 400.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                // Missing params mean the route itself is wrong
                if rejection.status().is_server_error() {
                    AppError::Internal(anyhow::anyhow!(rejection.body_text()))
                } else {
                    AppError::bad_request(rejection.body_text())
                }
            })?;

        Ok(Self(value))
    }
}
