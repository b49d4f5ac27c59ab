use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::AppError;
use crate::users::validation::ValidationErrors;

/// `Json<T>` whose rejections are rendered as `AppError` JSON bodies.
#[derive(Debug)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(AppError::from(rejection)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                warn!(error = %e, "request body has the wrong shape");
                AppError::Validation(ValidationErrors::body_not_object())
            }
            other => {
                warn!(error = %other, "request body rejected");
                AppError::BadBody {
                    status: other.status(),
                    message: other.body_text(),
                }
            }
        }
    }
}
