//! Request middleware
//!
//! - Request ids: every response carries `X-Request-Id`, echoed from the
//!   request when the caller sent one.
//! - Authentication: protected routes require the caller's GitHub token in the
//!   `Authorization` header. The token is not validated here; GitHub does that
//!   when the forwarded call is made.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::SecretString;
use url::Url;

use crate::errors::ApiError;

#[cfg(test)]
#[path = "middleware_tests.rs"]
mod tests;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Identifier of the current request, stored in request extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Authentication context attached to requests after the token was extracted.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// Caller's GitHub token, forwarded upstream
    pub token: SecretString,

    /// Proxy the caller asked the service to use, from `X-Proxy-URL`
    pub proxy_url: Option<Url>,
}

/// Assigns a request id, logs the request and stamps the id on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    tracing::info!(
        request_id = %request_id,
        method = %request.method(),
        uri = %request.uri(),
        "Request started"
    );

    request.extensions_mut().insert(RequestId(request_id.clone()));
    let mut response = next.run(request).await;

    tracing::info!(
        request_id = %request_id,
        status = %response.status(),
        "Request completed"
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// Requires a token on the request and attaches an [`AuthContext`].
///
/// Returns a 401 envelope when the `Authorization` header is missing or empty.
pub async fn auth_middleware(headers: HeaderMap, mut request: Request, next: Next) -> Response {
    let request_id = request
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let token = match headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(extract_token)
    {
        Some(token) => token,
        None => {
            return ApiError::unauthorized(
                "Authentication required. Provide a GitHub token in the Authorization header.",
            )
            .with_request_id(request_id)
            .into_response();
        }
    };

    let proxy_url = headers
        .get(github_client::PROXY_URL_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(parse_proxy_url);

    request.extensions_mut().insert(AuthContext {
        token: SecretString::from(token),
        proxy_url,
    });
    next.run(request).await
}

/// Extracts the token from an `Authorization` header value.
///
/// Accepts `token <t>`, `Bearer <t>` and a bare `<t>`.
pub fn extract_token(header: &str) -> Option<String> {
    let parts: Vec<&str> = header.split_whitespace().collect();
    let token = match parts.as_slice() {
        [token] => *token,
        [scheme, token]
            if scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer") =>
        {
            *token
        }
        _ => return None,
    };
    Some(token.to_string())
}

/// Parses the `X-Proxy-URL` header.
///
/// A valid URL makes the upstream call for this request leave through that
/// proxy. An invalid one is ignored.
fn parse_proxy_url(value: &str) -> Option<Url> {
    match Url::parse(value) {
        Ok(url) => {
            tracing::debug!(proxy = %url, "Caller supplied a proxy URL");
            Some(url)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring invalid X-Proxy-URL header");
            None
        }
    }
}
