//! HTTP response models
//!
//! Request bodies reuse the client's payload types
//! ([`github_client::RepositoryCreatePayload`] and
//! [`github_client::FileWritePayload`]) so both ends agree on the wire format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The wrapper around every `/api` response, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    /// HTTP status of the response
    pub code: u16,

    pub success: bool,

    pub message: String,

    /// The upstream payload, unchanged; absent on failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    /// When the response was produced (RFC 3339)
    pub timestamp: String,

    pub request_id: String,
}

impl ApiEnvelope {
    /// A `200` envelope carrying `data`.
    pub fn ok(data: Value, request_id: impl Into<String>) -> Self {
        Self {
            code: 200,
            success: true,
            message: "OK".to_string(),
            data: Some(data),
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: request_id.into(),
        }
    }

    /// A failure envelope with the given status and message.
    pub fn failure(code: u16, message: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            code,
            success: false,
            message: message.into(),
            data: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id: request_id.into(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthCheckResponse {
    /// Service status: "healthy" or "unhealthy"
    pub status: String,

    /// Service version
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Current timestamp (ISO 8601)
    pub timestamp: String,
}
