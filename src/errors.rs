use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

use crate::core::store::store_error::StoreError;
use crate::domain::analytics::service::time_range_service::TimeRangeError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Body parsing error: {0}")]
    BodyParsingError(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Document store error: {0}")]
    StoreError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

/// Helper for mapping any unknown error into internal error
pub fn internal_error<E: ToString>(err: E) -> AppError {
    AppError::InternalServerError(err.to_string())
}

/// Recovers the typed error behind a service `anyhow::Error`. Anything
/// unrecognised is an internal error carrying the full context chain.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        let err = match err.downcast::<AppError>() {
            Ok(app) => return app,
            Err(err) => err,
        };
        if let Some(e) = err.downcast_ref::<validator::ValidationErrors>() {
            return AppError::ValidationError(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<TimeRangeError>() {
            return AppError::ValidationError(e.to_string());
        }
        if let Some(e) = err.downcast_ref::<StoreError>() {
            return AppError::StoreError(e.to_string());
        }
        internal_error(format!("{err:#}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match self {
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::BodyParsingError(_) => StatusCode::BAD_REQUEST,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::StoreError(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
        };

        let body = Json(json!({
            "message": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_errors_survive_anyhow() {
        let not_found: AppError = anyhow::Error::from(AppError::NotFound("x".into())).into();
        assert!(matches!(not_found, AppError::NotFound(_)));

        let range: AppError = anyhow::Error::from(TimeRangeError::StartAfterEnd).into();
        assert!(matches!(range, AppError::ValidationError(ref m) if m == "Start date must be before end date"));

        let store: AppError = anyhow::Error::from(StoreError::Unavailable("down".into())).into();
        assert_eq!(store.into_response().status(), StatusCode::BAD_GATEWAY);

        let other: AppError = anyhow::anyhow!("boom").context("while testing").into();
        assert!(matches!(other, AppError::InternalServerError(ref m) if m == "while testing: boom"));
    }
}
