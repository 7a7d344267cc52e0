//! API error handling.
//!
//! Upstream and store failures are never propagated raw: they are logged
//! with their detail and translated to the nearest HTTP status, with a JSON
//! `{error}` body where the surface defines one.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::Error;

/// API error that converts to an HTTP response.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: Option<String>,
}

impl ApiError {
    /// A bare status with no body.
    pub fn status(status: StatusCode) -> Self {
        Self {
            status,
            message: None,
        }
    }

    /// A status with an `{error}` JSON body.
    pub fn with_message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.message {
            Some(message) => (
                self.status,
                Json(serde_json::json!({ "error": message })),
            )
                .into_response(),
            None => self.status.into_response(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::StoreUnavailable(message) => {
                ApiError::with_message(StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            Error::NotFound => ApiError::status(StatusCode::NOT_FOUND),
            Error::UnknownRelation(name) => {
                tracing::warn!(relation = %name, "no service registered for relation");
                ApiError::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Error::Upstream(error) => {
                tracing::warn!(%error, "upstream request failed");
                ApiError::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Error::Log(error) => {
                tracing::error!(%error, "event publish failed");
                ApiError::with_message(StatusCode::BAD_GATEWAY, "event log unavailable")
            }
            other => {
                tracing::error!(error = %other, "unexpected error");
                ApiError::status(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
