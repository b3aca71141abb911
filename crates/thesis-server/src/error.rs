//! HTTP error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thesis_core::ThesisError;

/// An error ready to leave a handler. Every failure serializes as
/// `{"error": "<message>"}` with the matching status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self { status: StatusCode::BAD_REQUEST, message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self { status: StatusCode::UNAUTHORIZED, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self { status: StatusCode::NOT_FOUND, message: message.into() }
    }

    /// Storage and other internal failures are logged in full but reach
    /// the client as a generic message.
    pub fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "internal server error".to_string(),
        }
    }
}

impl From<ThesisError> for ApiError {
    fn from(err: ThesisError) -> Self {
        match &err {
            ThesisError::DuplicateUsername
            | ThesisError::PasswordMismatch
            | ThesisError::AlreadyReviewed
            | ThesisError::MissingField(_)
            | ThesisError::InvalidUpload(_) => Self::bad_request(err.to_string()),
            ThesisError::InvalidCredentials
            | ThesisError::InvalidToken(_)
            | ThesisError::AccountNotFound => Self::unauthorized(err.to_string()),
            ThesisError::ThesisNotFound(_) => Self::not_found(err.to_string()),
            ThesisError::Database(e) => {
                tracing::error!("Storage failure: {:#}", e);
                Self::internal()
            }
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ThesisError::from(err).into()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}
