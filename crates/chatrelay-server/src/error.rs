//! Mapping from internal errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const MESSAGE_REQUIRED: &str = "Message is required";
pub const REPLY_FAILED: &str = "Failed to generate a reply";

#[derive(Debug, Error)]
pub enum AppError {
    /// Body absent, unparsable, or without a non-blank `message`.
    #[error("Message is required")]
    MissingMessage,

    #[error(transparent)]
    Internal(#[from] chatrelay_core::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingMessage => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            AppError::MissingMessage => MESSAGE_REQUIRED,
            AppError::Internal(e) => {
                // Details stay in the log; callers only get the generic text.
                error!("Chat request failed: {}", e);
                REPLY_FAILED
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::MissingMessage.status_code(), StatusCode::BAD_REQUEST);
        let internal = AppError::from(chatrelay_core::Error::Http("boom".into()));
        assert_eq!(internal.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
