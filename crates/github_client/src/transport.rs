//! Wire adapters for the two ways of reaching GitHub.
//!
//! [`UpstreamTransport`] talks to the GitHub REST API directly through
//! octocrab, or [`ProxiedUpstreamTransport`] does the same through an egress
//! proxy. [`IntermediaryTransport`] talks to the intermediary service, which
//! wraps every result in an envelope (`{code, message, data}`). All produce the
//! same thing: the bare JSON payload on success, or [`Error::Remote`] carrying
//! the status and the remote's message on failure. Everything above this module
//! decodes payloads exactly once, without knowing which transport was used.

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION};
use octocrab::{Octocrab, Result as OctocrabResult};
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::models::{FileWritePayload, Identity, RepositoryCreatePayload};
use crate::Error;

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;

/// Header carrying the proxy the intermediary should use for its own egress.
pub const PROXY_URL_HEADER: &str = "X-Proxy-URL";

/// The remote operations, independent of how they travel.
///
/// The identity call is deliberately absent: it never goes through a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiRequest {
    ListRepositories,
    ListDirectory {
        owner: String,
        repo: String,
        path: String,
    },
    CreateRepository(RepositoryCreatePayload),
    WriteFile {
        owner: String,
        repo: String,
        path: String,
        payload: FileWritePayload,
    },
}

impl ApiRequest {
    /// Short operation name for logs.
    pub fn operation(&self) -> &'static str {
        match self {
            ApiRequest::ListRepositories => "list_repositories",
            ApiRequest::ListDirectory { .. } => "list_directory",
            ApiRequest::CreateRepository(_) => "create_repository",
            ApiRequest::WriteFile { .. } => "write_file",
        }
    }
}

/// Sends an [`ApiRequest`] and returns the unwrapped payload.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues the request.
    ///
    /// # Errors
    ///
    /// - `Error::Remote` for a non-success HTTP status
    /// - `Error::Transport` when the request could not be completed
    async fn send(&self, request: &ApiRequest) -> Result<Value, Error>;

    /// Name of the transport for logs (`"upstream"` or `"intermediary"`).
    fn name(&self) -> &'static str;
}

#[derive(Serialize)]
struct ListRepositoriesQuery {
    sort: &'static str,
    per_page: u8,
}

/// Direct calls to the GitHub REST API.
#[derive(Debug, Clone)]
pub struct UpstreamTransport {
    client: Octocrab,
}

impl UpstreamTransport {
    pub fn new(client: Octocrab) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for UpstreamTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, Error> {
        let result: OctocrabResult<Value> = match request {
            ApiRequest::ListRepositories => {
                let query = ListRepositoriesQuery {
                    sort: "updated",
                    per_page: 100,
                };
                self.client.get("/user/repos", Some(&query)).await
            }
            ApiRequest::ListDirectory { owner, repo, path } => {
                let route = contents_route(owner, repo, path)?;
                self.client.get(route, None::<&()>).await
            }
            ApiRequest::CreateRepository(payload) => {
                self.client.post("/user/repos", Some(payload)).await
            }
            ApiRequest::WriteFile {
                owner,
                repo,
                path,
                payload,
            } => {
                let route = contents_route(owner, repo, path)?;
                self.client.put(route, Some(payload)).await
            }
        };

        result.map_err(|e| map_octocrab_error(request.operation(), e))
    }

    fn name(&self) -> &'static str {
        "upstream"
    }
}

/// Calls routed through the intermediary service.
#[derive(Debug, Clone)]
pub struct IntermediaryTransport {
    http: reqwest::Client,
    endpoint: Url,
    credential: SecretString,
    proxy_url: Option<String>,
}

impl IntermediaryTransport {
    /// Creates a transport for the intermediary at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Transport` if the endpoint is not a valid base URL or the
    /// HTTP client cannot be built.
    pub fn new(
        endpoint: &str,
        credential: SecretString,
        proxy_url: Option<String>,
    ) -> Result<Self, Error> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            Error::Transport(format!("Invalid intermediary endpoint '{}': {}", endpoint, e))
        })?;
        if endpoint.cannot_be_a_base() {
            return Err(Error::Transport(format!(
                "Intermediary endpoint '{}' cannot be used as a base URL",
                endpoint
            )));
        }

        let http = reqwest::Client::builder()
            .user_agent(concat!("net-disk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            endpoint,
            credential,
            proxy_url,
        })
    }

    fn url_for(&self, segments: &[&str], path: &str) -> Result<Url, Error> {
        let mut url = self.endpoint.clone();
        {
            let mut parts = url
                .path_segments_mut()
                .map_err(|_| Error::Transport("Intermediary endpoint cannot be a base".into()))?;
            parts.pop_if_empty();
            parts.extend(segments);
            parts.extend(path_segments(path));
        }
        Ok(url)
    }

    fn describe(&self, request: &ApiRequest) -> Result<(Method, Url, Option<Value>), Error> {
        Ok(match request {
            ApiRequest::ListRepositories => (Method::GET, self.url_for(&["api", "repos"], "")?, None),
            ApiRequest::ListDirectory { owner, repo, path } => (
                Method::GET,
                self.url_for(&["api", "files", owner, repo], path)?,
                None,
            ),
            ApiRequest::CreateRepository(payload) => (
                Method::POST,
                self.url_for(&["api", "repos"], "")?,
                Some(serde_json::to_value(payload)?),
            ),
            ApiRequest::WriteFile {
                owner,
                repo,
                path,
                payload,
            } => (
                Method::PUT,
                self.url_for(&["api", "file", owner, repo], path)?,
                Some(serde_json::to_value(payload)?),
            ),
        })
    }
}

#[async_trait]
impl Transport for IntermediaryTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, Error> {
        let (method, url, body) = self.describe(request)?;
        debug!(operation = request.operation(), %method, %url, "Calling intermediary");

        let mut builder = self
            .http
            .request(method, url)
            .header(
                AUTHORIZATION,
                format!("token {}", self.credential.expose_secret()),
            )
            .header(ACCEPT, "application/json");
        if let Some(proxy_url) = &self.proxy_url {
            builder = builder.header(PROXY_URL_HEADER, proxy_url);
        }
        if let Some(body) = body {
            builder = builder.json(&body);
        }

        let text = execute(builder, request.operation(), "intermediary").await?;
        unwrap_envelope(&text)
    }

    fn name(&self) -> &'static str {
        "intermediary"
    }
}

/// Direct calls to the GitHub REST API through an egress proxy.
///
/// Used by the intermediary service when a caller asks for its GitHub
/// traffic to leave through a specific `http`, `https` or `socks5` proxy.
#[derive(Debug, Clone)]
pub struct ProxiedUpstreamTransport {
    http: reqwest::Client,
    base_url: String,
    credential: SecretString,
}

impl ProxiedUpstreamTransport {
    /// Creates a transport that reaches `base_url` through `proxy_url`.
    ///
    /// # Errors
    ///
    /// Returns `Error::Validation` when the proxy URL is not usable and
    /// `Error::Transport` when the base URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(base_url: &str, credential: SecretString, proxy_url: &str) -> Result<Self, Error> {
        Url::parse(base_url).map_err(|e| {
            Error::Transport(format!("Invalid GitHub API base URL '{}': {}", base_url, e))
        })?;
        let proxy = reqwest::Proxy::all(proxy_url)
            .map_err(|e| Error::Validation(format!("Invalid proxy URL '{}': {}", proxy_url, e)))?;

        let http = reqwest::Client::builder()
            .user_agent(concat!("net-disk/", env!("CARGO_PKG_VERSION")))
            .proxy(proxy)
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credential,
        })
    }

    /// Fetches the account the credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthError` for any failure.
    pub async fn current_user(&self) -> Result<Identity, Error> {
        let text = execute(self.request(Method::GET, "/user"), "current_user", "upstream")
            .await
            .map_err(|e| Error::AuthError(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| Error::AuthError(e.to_string()))
    }

    fn request(&self, method: Method, route: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}{}", self.base_url, route))
            .header(
                AUTHORIZATION,
                format!("Bearer {}", self.credential.expose_secret()),
            )
            .header(ACCEPT, "application/vnd.github+json")
    }
}

#[async_trait]
impl Transport for ProxiedUpstreamTransport {
    async fn send(&self, request: &ApiRequest) -> Result<Value, Error> {
        let builder = match request {
            ApiRequest::ListRepositories => {
                self.request(Method::GET, "/user/repos")
                    .query(&ListRepositoriesQuery {
                        sort: "updated",
                        per_page: 100,
                    })
            }
            ApiRequest::ListDirectory { owner, repo, path } => {
                self.request(Method::GET, &contents_route(owner, repo, path)?)
            }
            ApiRequest::CreateRepository(payload) => {
                self.request(Method::POST, "/user/repos").json(payload)
            }
            ApiRequest::WriteFile {
                owner,
                repo,
                path,
                payload,
            } => self
                .request(Method::PUT, &contents_route(owner, repo, path)?)
                .json(payload),
        };
        debug!(operation = request.operation(), "Calling GitHub through proxy");

        let text = execute(builder, request.operation(), "upstream").await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn name(&self) -> &'static str {
        "proxied-upstream"
    }
}

/// Sends `builder` and returns the body of a successful response.
///
/// A non-success status becomes `Error::Remote` carrying the body's message.
async fn execute(
    builder: reqwest::RequestBuilder,
    operation: &str,
    remote: &str,
) -> Result<String, Error> {
    let response = builder.send().await.map_err(|e| {
        error!(operation, remote, error = %e, "Request failed");
        Error::Transport(e.to_string())
    })?;
    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Transport(format!("Failed to read response body: {}", e)))?;

    if !status.is_success() {
        warn!(operation, remote, status = status.as_u16(), "Remote returned an error status");
        return Err(Error::remote(status.as_u16(), error_message(&text)));
    }
    Ok(text)
}

/// The intermediary's response wrapper.
///
/// Both `code`/`status` and `data`/`payload` spellings are accepted.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Envelope {
    #[serde(default, alias = "status")]
    pub code: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default, alias = "payload")]
    pub data: Option<Value>,
}

impl Envelope {
    fn code_number(&self) -> Option<u16> {
        match &self.code {
            Some(Value::Number(n)) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
            Some(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }
}

/// Extracts the payload from an intermediary response body.
///
/// A body that is not an envelope, or an envelope without a payload, yields
/// `Value::Null`, which the listing decoders read as "empty". An envelope that
/// explicitly reports `success: false` is turned into `Error::Remote`.
pub fn unwrap_envelope(body: &str) -> Result<Value, Error> {
    let envelope: Envelope = match serde_json::from_str(body) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Intermediary response is not an envelope");
            return Ok(Value::Null);
        }
    };

    if envelope.success == Some(false) {
        let status = envelope.code_number().unwrap_or(500);
        return Err(Error::remote(status, envelope.message));
    }

    Ok(envelope.data.unwrap_or(Value::Null))
}

/// Pulls a human-readable message out of an error body, if it has one.
///
/// GitHub uses `message`; the intermediary uses `message` inside its envelope
/// and `error` for its own authentication failures.
pub fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Splits a repository path into its non-empty segments.
pub(crate) fn path_segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Builds the percent-encoded `/repos/{owner}/{repo}/contents/{path}` route.
pub(crate) fn contents_route(owner: &str, repo: &str, path: &str) -> Result<String, Error> {
    let mut url = Url::parse("http://localhost/")
        .map_err(|e| Error::Transport(format!("Failed to build route: {}", e)))?;
    {
        let mut parts = url
            .path_segments_mut()
            .map_err(|_| Error::Transport("Failed to build route".to_string()))?;
        parts.pop_if_empty();
        parts.extend(["repos", owner, repo, "contents"]);
        parts.extend(path_segments(path));
    }
    Ok(url.path().to_string())
}

fn map_octocrab_error(operation: &str, e: octocrab::Error) -> Error {
    match e {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            debug!(
                operation = operation,
                status = status,
                error_message = source.message.as_str(),
                "GitHub returned an error status"
            );
            Error::remote(status, Some(source.message.clone()))
        }
        other => {
            crate::log_octocrab_error(operation, &other);
            Error::Transport(other.to_string())
        }
    }
}
