//! GitNetDisk intermediary service
//!
//! An HTTP service that sits between the file manager and GitHub. It exposes
//! the five remote operations under `/api`, forwards each one to GitHub with
//! the caller's own token, and wraps every result in the response envelope:
//!
//! ```json
//! { "code": 200, "success": true, "message": "OK", "data": ..., "timestamp": "...", "requestId": "..." }
//! ```
//!
//! The service holds no credentials of its own; a new upstream client is
//! built for every request.

pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;

pub use errors::ApiError;
pub use models::{ApiEnvelope, HealthCheckResponse};
pub use server::{ApiConfig, ApiServer};

/// Default API port
pub const DEFAULT_PORT: u16 = 3000;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    /// Base URL of the GitHub REST API requests are forwarded to
    pub upstream_url: String,
}

impl AppState {
    pub fn new(upstream_url: impl Into<String>) -> Self {
        Self {
            upstream_url: upstream_url.into(),
        }
    }
}
