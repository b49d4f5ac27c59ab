use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::users::validation::ValidationErrors;

/// Failure reported by a `UserStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already in use")]
    DuplicateEmail,
    #[error("database error")]
    Database(#[from] sqlx::Error),
}

/// Error returned by handlers; rendered into an HTTP response.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("not found")]
    NotFound,
    /// Body could not be read as JSON at all.
    #[error("unreadable body: {message}")]
    BadBody { status: StatusCode, message: String },
    #[error("store failure")]
    Store(#[source] StoreError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            // The unique constraint won a race against the pre-check.
            StoreError::DuplicateEmail => Self::Validation(ValidationErrors::email_taken()),
            other => Self::Store(other),
        }
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadBody { status, .. } => *status,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            Self::Validation(errors) => (
                status,
                Json(json!({
                    "message": errors.summary(),
                    "errors": errors,
                })),
            )
                .into_response(),
            Self::NotFound => status.into_response(),
            Self::BadBody { message, .. } => {
                (status, Json(json!({ "message": message }))).into_response()
            }
            Self::Store(e) => {
                error!(error = ?e, "store failure");
                (status, Json(json!({ "message": "Server Error" }))).into_response()
            }
            Self::Internal(e) => {
                error!(error = ?e, "internal error");
                (status, Json(json!({ "message": "Server Error" }))).into_response()
            }
        }
    }
}
