//! Error types for GitHub client operations.
//!
//! This module defines the error types that can occur when talking to the GitHub
//! Contents API, either directly or through the intermediary service. Both wire
//! formats are folded into the same variants so callers never branch on the
//! transport in use.

use http::StatusCode;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur during GitHub client operations.
///
/// ## Examples
///
/// ```rust,ignore
/// use github_client::Error;
///
/// match client.upload_file("octocat", "notes", "a.txt", b"hi", None).await {
///     Ok(()) => println!("uploaded"),
///     Err(e) if e.is_rate_limited() => eprintln!("Rate limit hit, try again later"),
///     Err(e) => eprintln!("Upload failed: {}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The credential is missing, invalid, or the identity call failed.
    ///
    /// This blocks entry into the browsing view and is always surfaced to the
    /// user immediately.
    #[error("Failed to authenticate with GitHub: {0}")]
    AuthError(String),

    /// Error deserializing a response body.
    #[error("Failed to deserialize GitHub response: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The remote returned a payload that does not have the expected shape.
    #[error("Invalid response format")]
    InvalidResponse,

    /// A non-success status from a list or create operation.
    ///
    /// `message` carries the remote's own message when one was present and the
    /// canonical reason phrase for the status otherwise.
    #[error("GitHub request failed with status {status}: {message}")]
    Remote { status: u16, message: String },

    /// A single file write failed.
    ///
    /// Upload failures are accumulated by the batch orchestrator rather than
    /// surfaced one by one.
    #[error("Failed to upload {path}: {status_code} {status_text}: {message}")]
    Upload {
        path: String,
        status_code: u16,
        status_text: String,
        message: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("Failed to reach the remote service: {0}")]
    Transport(String),

    /// The remote rejected the request as invalid (for example a duplicate
    /// repository name).
    #[error("Validation failed: {0}")]
    Validation(String),
}

impl Error {
    /// Builds a [`Error::Remote`] from a status code, falling back to the
    /// canonical reason phrase when the remote supplied no message.
    pub fn remote(status: u16, message: Option<String>) -> Self {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| reason_phrase(status).to_string());
        Error::Remote { status, message }
    }

    /// Returns the HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Remote { status, .. } => Some(*status),
            Error::Upload { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Returns `true` when the failure indicates the remote's rate limit was
    /// exceeded.
    ///
    /// GitHub reports primary rate limits as `403` with a message along the
    /// lines of "API rate limit exceeded for user", and secondary limits as
    /// `429`. The message is checked rather than the status alone because a
    /// plain `403` also means "no permission".
    pub fn is_rate_limited(&self) -> bool {
        match self {
            Error::Remote { status, message } => {
                *status == 429 || mentions_rate_limit(message)
            }
            Error::Upload {
                status_code,
                status_text,
                message,
                ..
            } => {
                *status_code == 429
                    || mentions_rate_limit(status_text)
                    || mentions_rate_limit(message)
            }
            _ => false,
        }
    }
}

/// Returns the canonical reason phrase for a status code, or an empty string
/// for codes without one.
pub fn reason_phrase(status: u16) -> &'static str {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("")
}

fn mentions_rate_limit(text: &str) -> bool {
    text.to_ascii_lowercase().contains("rate limit")
}
