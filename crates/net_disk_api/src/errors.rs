//! Error handling and HTTP error conversion
//!
//! Client errors from `github_client` are converted to failure envelopes at the
//! HTTP boundary. The upstream status is kept whenever it is an error status so
//! that callers can tell a missing directory (404) from a rejected repository
//! name (422).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::ApiEnvelope;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// A failed `/api` request, rendered as a failure envelope.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub request_id: Option<String>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            request_id: None,
        }
    }

    /// Create an authentication error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

impl From<github_client::Error> for ApiError {
    fn from(err: github_client::Error) -> Self {
        use github_client::Error;

        match err {
            Error::AuthError(message) => Self::unauthorized(message),
            Error::Validation(message) => Self::validation(message),
            Error::Remote { status, message } => Self::new(upstream_status(status), message),
            Error::Upload {
                status_code,
                message,
                ..
            } => Self::new(upstream_status(status_code), message),
            other @ (Error::Transport(_) | Error::Deserialization(_) | Error::InvalidResponse) => {
                Self::new(StatusCode::BAD_GATEWAY, other.to_string())
            }
        }
    }
}

/// Keeps an upstream error status; anything else becomes `502`.
fn upstream_status(status: u16) -> StatusCode {
    match StatusCode::from_u16(status) {
        Ok(code) if code.is_client_error() || code.is_server_error() => code,
        _ => StatusCode::BAD_GATEWAY,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        log_error(&self);

        let request_id = self
            .request_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let envelope = ApiEnvelope::failure(self.status.as_u16(), self.message, request_id);

        (self.status, Json(envelope)).into_response()
    }
}

/// Log error with appropriate level based on HTTP status
fn log_error(error: &ApiError) {
    let request_id = error.request_id.as_deref().unwrap_or("-");
    if error.status.is_server_error() {
        tracing::error!(request_id, status = error.status.as_u16(), "API error: {}", error.message);
    } else if error.status == StatusCode::UNAUTHORIZED {
        tracing::info!(request_id, status = error.status.as_u16(), "API error: {}", error.message);
    } else {
        tracing::warn!(request_id, status = error.status.as_u16(), "API error: {}", error.message);
    }
}
