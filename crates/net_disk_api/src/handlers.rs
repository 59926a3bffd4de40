//! HTTP request handlers
//!
//! Each handler builds an upstream client from the caller's token, forwards
//! one operation to GitHub and wraps the payload in an [`ApiEnvelope`]. When
//! the caller names a proxy, the upstream call leaves through it.
//! Payloads pass through unchanged; the file manager decodes them.

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use secrecy::ExposeSecret;
use serde_json::Value;

use github_client::{
    ApiRequest, FileWritePayload, GitHubClient, ProxiedUpstreamTransport, RepositoryClient,
    RepositoryCreatePayload, Transport, UpstreamTransport,
};

use crate::{
    errors::ApiError,
    middleware::{AuthContext, RequestId},
    models::{ApiEnvelope, HealthCheckResponse},
    AppState,
};

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;

type ApiResult = Result<Json<ApiEnvelope>, ApiError>;

/// GET /health
///
/// Always returns healthy status if the server is running.
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "healthy".to_string(),
        version: Some(env!("CARGO_PKG_VERSION").to_string()),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// GET /api/user
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> ApiResult {
    let identity = match &auth.proxy_url {
        Some(proxy) => {
            ProxiedUpstreamTransport::new(
                &state.upstream_url,
                auth.token.clone(),
                proxy.as_str(),
            )
            .map_err(|e| ApiError::from(e).with_request_id(&request_id))?
            .current_user()
            .await
        }
        None => {
            let octocrab = github_client::create_token_client(
                auth.token.expose_secret(),
                Some(state.upstream_url.as_str()),
            )
            .map_err(|e| ApiError::from(e).with_request_id(&request_id))?;
            GitHubClient::new(octocrab).fetch_current_user().await
        }
    }
    .map_err(|e| ApiError::from(e).with_request_id(&request_id))?;
    let data = serde_json::to_value(identity)
        .map_err(|e| ApiError::from(github_client::Error::from(e)).with_request_id(&request_id))?;

    Ok(Json(ApiEnvelope::ok(data, request_id)))
}

/// GET /api/repos
pub async fn list_repositories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(request_id): Extension<RequestId>,
) -> ApiResult {
    forward(&state, &auth, request_id, ApiRequest::ListRepositories).await
}

/// POST /api/repos
pub async fn create_repository(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(request_id): Extension<RequestId>,
    Json(payload): Json<RepositoryCreatePayload>,
) -> ApiResult {
    if payload.name.trim().is_empty() {
        return Err(ApiError::validation("Repository name is required").with_request_id(request_id.0));
    }
    forward(&state, &auth, request_id, ApiRequest::CreateRepository(payload)).await
}

/// GET /api/files/:owner/:repo
pub async fn list_root(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(request_id): Extension<RequestId>,
    Path((owner, repo)): Path<(String, String)>,
) -> ApiResult {
    let request = ApiRequest::ListDirectory {
        owner,
        repo,
        path: String::new(),
    };
    forward(&state, &auth, request_id, request).await
}

/// GET /api/files/:owner/:repo/*path
pub async fn list_directory(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(request_id): Extension<RequestId>,
    Path((owner, repo, path)): Path<(String, String, String)>,
) -> ApiResult {
    let request = ApiRequest::ListDirectory { owner, repo, path };
    forward(&state, &auth, request_id, request).await
}

/// PUT /api/file/:owner/:repo/*path
pub async fn write_file(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Extension(request_id): Extension<RequestId>,
    Path((owner, repo, path)): Path<(String, String, String)>,
    Json(payload): Json<FileWritePayload>,
) -> ApiResult {
    let request = ApiRequest::WriteFile {
        owner,
        repo,
        path,
        payload,
    };
    forward(&state, &auth, request_id, request).await
}

/// Sends `request` upstream with the caller's token.
async fn forward(
    state: &AppState,
    auth: &AuthContext,
    RequestId(request_id): RequestId,
    request: ApiRequest,
) -> ApiResult {
    let transport = upstream_transport(state, auth)
        .map_err(|e| ApiError::from(e).with_request_id(&request_id))?;
    tracing::debug!(
        request_id = %request_id,
        transport = transport.name(),
        "Forwarding request"
    );

    let data: Value = transport.send(&request).await.map_err(|e| {
        tracing::warn!(
            request_id = %request_id,
            operation = request.operation(),
            error = %e,
            "Upstream call failed"
        );
        ApiError::from(e).with_request_id(&request_id)
    })?;

    tracing::debug!(
        request_id = %request_id,
        operation = request.operation(),
        "Upstream call succeeded"
    );
    Ok(Json(ApiEnvelope::ok(data, request_id)))
}

/// Picks the upstream transport for one request.
fn upstream_transport(
    state: &AppState,
    auth: &AuthContext,
) -> Result<Box<dyn Transport>, github_client::Error> {
    match &auth.proxy_url {
        Some(proxy) => Ok(Box::new(ProxiedUpstreamTransport::new(
            &state.upstream_url,
            auth.token.clone(),
            proxy.as_str(),
        )?)),
        None => {
            let octocrab = github_client::create_token_client(
                auth.token.expose_secret(),
                Some(state.upstream_url.as_str()),
            )?;
            Ok(Box::new(UpstreamTransport::new(octocrab)))
        }
    }
}
