//! Client configuration.
//!
//! A [`ClientConfig`] is built once per login and handed to
//! [`GitHubClient::from_config`](crate::GitHubClient::from_config). Nothing in
//! this crate reads process-wide state; swapping credentials or endpoints means
//! building a new client.

use secrecy::SecretString;

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Base URL of the public GitHub REST API.
pub const DEFAULT_UPSTREAM_URL: &str = "https://api.github.com";

/// Address the intermediary service listens on by default.
pub const DEFAULT_INTERMEDIARY_URL: &str = "http://localhost:3000";

/// Connection settings for a [`GitHubClient`](crate::GitHubClient).
///
/// # Examples
///
/// ```rust
/// use github_client::ClientConfig;
///
/// let config = ClientConfig::new("ghp_example")
///     .with_intermediary(Some("http://localhost:3000".to_string()))
///     .with_proxy_url(Some("socks5://127.0.0.1:1080".to_string()));
///
/// assert!(config.use_intermediary);
/// assert_eq!(config.intermediary_endpoint(), "http://localhost:3000");
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Personal access token used for every call
    pub credential: SecretString,

    /// Base URL of the upstream GitHub API
    pub upstream_url: String,

    /// Intermediary base URL; [`DEFAULT_INTERMEDIARY_URL`] when unset
    pub intermediary_endpoint: Option<String>,

    /// Route everything except the identity call through the intermediary
    pub use_intermediary: bool,

    /// Egress proxy the intermediary should use, sent as `X-Proxy-URL`
    pub proxy_url: Option<String>,
}

impl ClientConfig {
    /// Creates a direct-to-GitHub configuration for the given token.
    pub fn new(credential: impl Into<String>) -> Self {
        Self {
            credential: SecretString::from(credential.into()),
            upstream_url: DEFAULT_UPSTREAM_URL.to_string(),
            intermediary_endpoint: None,
            use_intermediary: false,
            proxy_url: None,
        }
    }

    /// Overrides the upstream API base URL (GitHub Enterprise, tests).
    pub fn with_upstream_url(mut self, url: impl Into<String>) -> Self {
        self.upstream_url = url.into();
        self
    }

    /// Enables the intermediary, optionally at a specific endpoint.
    pub fn with_intermediary(mut self, endpoint: Option<String>) -> Self {
        self.use_intermediary = true;
        self.intermediary_endpoint = endpoint.filter(|e| !e.trim().is_empty());
        self
    }

    /// Sets the proxy URL forwarded to the intermediary. Blank values clear it.
    pub fn with_proxy_url(mut self, proxy_url: Option<String>) -> Self {
        self.proxy_url = proxy_url.filter(|p| !p.trim().is_empty());
        self
    }

    /// The intermediary endpoint in effect.
    pub fn intermediary_endpoint(&self) -> &str {
        self.intermediary_endpoint
            .as_deref()
            .unwrap_or(DEFAULT_INTERMEDIARY_URL)
    }
}
