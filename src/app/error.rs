//! Conversion of [`ConfluenceError`] into HTTP responses.

use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::utils::error::{ConfluenceError, ErrorCategory};

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
}

/// JSON body extractor whose rejections become 400 responses in the common error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ConfluenceError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for ConfluenceError {
    fn from(rejection: JsonRejection) -> Self {
        ConfluenceError::validation(rejection.body_text())
    }
}

pub fn status_code(error: &ConfluenceError) -> StatusCode {
    match error.category() {
        ErrorCategory::Client => StatusCode::BAD_REQUEST,
        ErrorCategory::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorCategory::Configuration
        | ErrorCategory::Dependency
        | ErrorCategory::Execution
        | ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ConfluenceError {
    fn into_response(self) -> Response {
        let status = status_code(&self);

        if status.is_server_error() {
            tracing::error!(
                "❌ Request failed: {} (Category: {:?}, Status: {})",
                self,
                self.category(),
                status.as_u16()
            );
            tracing::error!("💡 Recovery suggestion: {}", self.recovery_suggestion());
        } else {
            tracing::warn!("Rejected request: {}", self);
        }

        let body = ErrorResponse {
            detail: self.to_string(),
            error_type: self.kind().to_string(),
        };
        (status, Json(body)).into_response()
    }
}
