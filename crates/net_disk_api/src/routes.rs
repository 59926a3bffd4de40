//! HTTP routing configuration
//!
//! # Route Structure
//!
//! - GET  /health - Health check (no authentication)
//! - GET  /api/user - Identity of the token's owner
//! - GET  /api/repos - List repositories
//! - POST /api/repos - Create repository
//! - GET  /api/files/:owner/:repo[/*path] - List a directory
//! - PUT  /api/file/:owner/:repo/*path - Create or replace a file

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderName, Method},
    middleware,
    routing::{get, put},
    Router,
};
use std::time::Duration;
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{handlers, middleware as api_middleware, AppState};

#[cfg(test)]
#[path = "routes_tests.rs"]
mod tests;

/// Upper bound on a single forwarded request, upload included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Largest accepted request body, sized for base64 file content.
pub const MAX_REQUEST_BODY_BYTES: usize = 150 * 1024 * 1024;

/// Create the complete router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static("x-proxy-url"),
            HeaderName::from_static(api_middleware::REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(api_middleware::REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(3600));

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new())
        .on_response(DefaultOnResponse::new());

    let api_routes = Router::new()
        .route("/user", get(handlers::get_user))
        .route(
            "/repos",
            get(handlers::list_repositories).post(handlers::create_repository),
        )
        .route("/files/:owner/:repo", get(handlers::list_root))
        .route("/files/:owner/:repo/*path", get(handlers::list_directory))
        .route("/file/:owner/:repo/*path", put(handlers::write_file))
        .route_layer(middleware::from_fn(api_middleware::auth_middleware))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES));

    Router::new()
        .nest("/api", api_routes)
        .route("/health", get(handlers::health_check))
        .layer(middleware::from_fn(api_middleware::request_id_middleware))
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(trace_layer)
        .layer(cors)
        .with_state(state)
}
