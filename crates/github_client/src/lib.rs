//! Crate for interacting with GitHub repositories as a file store.
//!
//! This crate provides a client for making authenticated requests to GitHub
//! with a personal access token, either directly against the REST API or
//! through the intermediary service. Both routes expose the same five
//! operations through the [`RepositoryClient`] trait.

use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use octocrab::{Octocrab, Result as OctocrabResult};
use secrecy::ExposeSecret;
use tracing::{debug, error, info, instrument, warn};

pub mod config;
pub use config::{ClientConfig, DEFAULT_INTERMEDIARY_URL, DEFAULT_UPSTREAM_URL};

pub mod contents;
pub use contents::{
    compare_entries, compare_names, decode_listing, format_size, sort_entries, DirectoryEntry,
    EntryKind, EntryType, TreeEntry, NOT_APPLICABLE,
};

pub mod errors;
pub use errors::{reason_phrase, Error};

pub mod models;
pub use models::{FileWritePayload, Identity, Repository, RepositoryCreatePayload};

pub mod transport;
pub use transport::{
    ApiRequest, Envelope, IntermediaryTransport, ProxiedUpstreamTransport, Transport,
    UpstreamTransport, PROXY_URL_HEADER,
};

// Reference the tests module in the separate file
#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;

/// Commit message used when the caller does not supply one.
pub fn default_commit_message(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    format!("Upload {} via GitNetDisk", file_name)
}

/// Encodes file content for the Contents API.
///
/// Content that already is a base64 data URI (`data:<type>;base64,<data>`) has
/// its prefix stripped and the remainder is sent as is. Anything else is
/// base64 encoded.
pub fn encode_content(content: &[u8]) -> String {
    if content.starts_with(b"data:") {
        if let Ok(text) = std::str::from_utf8(content) {
            if let Some((_, data)) = text.split_once(";base64,") {
                return data.to_string();
            }
        }
    }
    STANDARD.encode(content)
}

/// Operations on the authenticated user's repositories.
#[async_trait]
pub trait RepositoryClient: Send + Sync {
    /// Fetches the account the credential belongs to.
    ///
    /// Always goes directly to GitHub, even when the intermediary is enabled.
    ///
    /// # Errors
    /// Returns `Error::AuthError` for any failure.
    async fn fetch_current_user(&self) -> Result<Identity, Error>;

    /// Lists the user's repositories, most recently updated first, as returned
    /// by the remote.
    ///
    /// # Errors
    /// Returns `Error::Remote` for a non-success status.
    async fn list_repositories(&self) -> Result<Vec<Repository>, Error>;

    /// Lists one directory of a repository in presentation order.
    ///
    /// A missing path, or a path that names a file, yields an empty listing.
    ///
    /// # Errors
    /// Returns `Error::Remote` for any non-success status other than 404.
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, Error>;

    /// Creates a repository for the authenticated user.
    ///
    /// # Errors
    /// Returns `Error::Validation` when the remote rejects the request (for
    /// example, the name is already taken) and `Error::Remote` otherwise.
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
        auto_init: bool,
    ) -> Result<Repository, Error>;

    /// Creates or replaces a single file.
    ///
    /// # Errors
    /// Returns `Error::Upload` when the write is rejected.
    async fn upload_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        commit_message: Option<&str>,
    ) -> Result<(), Error>;
}

/// A client for GitHub repository contents, authenticated with a personal
/// access token.
#[derive(Clone)]
pub struct GitHubClient {
    upstream: Octocrab,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl GitHubClient {
    /// Creates a client that sends every call directly to GitHub.
    pub fn new(client: Octocrab) -> Self {
        let transport = Arc::new(UpstreamTransport::new(client.clone()));
        Self {
            upstream: client,
            transport,
        }
    }

    /// Creates a client that uses `transport` for everything except the
    /// identity call, which always goes through `upstream`.
    pub fn with_transport(upstream: Octocrab, transport: Arc<dyn Transport>) -> Self {
        Self {
            upstream,
            transport,
        }
    }

    /// Builds a client from configuration.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Returns `Error::AuthError` if the upstream client cannot be built and
    /// `Error::Transport` if the intermediary endpoint is invalid.
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let upstream = create_token_client(
            config.credential.expose_secret(),
            Some(config.upstream_url.as_str()),
        )?;

        if !config.use_intermediary {
            return Ok(Self::new(upstream));
        }

        info!(
            endpoint = config.intermediary_endpoint(),
            proxy = config.proxy_url.is_some(),
            "Routing requests through the intermediary"
        );
        let transport = IntermediaryTransport::new(
            config.intermediary_endpoint(),
            config.credential.clone(),
            config.proxy_url.clone(),
        )?;
        Ok(Self::with_transport(upstream, Arc::new(transport)))
    }

    /// Name of the transport in use (`"upstream"` or `"intermediary"`).
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }
}

#[async_trait]
impl RepositoryClient for GitHubClient {
    #[instrument(skip(self))]
    async fn fetch_current_user(&self) -> Result<Identity, Error> {
        let response: OctocrabResult<Identity> = self.upstream.get("/user", None::<&()>).await;
        match response {
            Ok(identity) => {
                info!(login = identity.login.as_str(), "Authenticated with GitHub");
                Ok(identity)
            }
            Err(e) => {
                let message = match &e {
                    octocrab::Error::GitHub { source, .. } => source.message.clone(),
                    other => other.to_string(),
                };
                log_octocrab_error("Failed to fetch the authenticated user", &e);
                Err(Error::AuthError(message))
            }
        }
    }

    #[instrument(skip(self), fields(transport = self.transport.name()))]
    async fn list_repositories(&self) -> Result<Vec<Repository>, Error> {
        let payload = self.transport.send(&ApiRequest::ListRepositories).await?;

        let serde_json::Value::Array(items) = payload else {
            debug!("Repository payload is not an array, treating it as empty");
            return Ok(Vec::new());
        };

        let repositories: Vec<Repository> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<Repository>(item) {
                Ok(repo) => Some(repo),
                Err(e) => {
                    debug!(error = %e, "Skipping unrecognised repository record");
                    None
                }
            })
            .collect();

        info!(count = repositories.len(), "Listed repositories");
        Ok(repositories)
    }

    #[instrument(skip(self), fields(transport = self.transport.name()))]
    async fn list_directory(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, Error> {
        let request = ApiRequest::ListDirectory {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.trim_matches('/').to_string(),
        };

        match self.transport.send(&request).await {
            Ok(payload) => Ok(decode_listing(payload)),
            Err(Error::Remote { status: 404, .. }) => {
                debug!(owner, repo, path, "Directory not found, returning empty listing");
                Ok(Vec::new())
            }
            Err(e) => {
                warn!(owner, repo, path, error = %e, "Failed to list directory");
                Err(e)
            }
        }
    }

    #[instrument(skip(self, description), fields(transport = self.transport.name()))]
    async fn create_repository(
        &self,
        name: &str,
        description: &str,
        is_private: bool,
        auto_init: bool,
    ) -> Result<Repository, Error> {
        let payload = RepositoryCreatePayload {
            name: name.to_string(),
            description: description.to_string(),
            private: is_private,
            auto_init,
        };

        let value = match self
            .transport
            .send(&ApiRequest::CreateRepository(payload))
            .await
        {
            Ok(value) => value,
            Err(Error::Remote {
                status: 422,
                message,
            }) => {
                warn!(name, message = message.as_str(), "Repository creation rejected");
                return Err(Error::Validation(message));
            }
            Err(e) => {
                error!(name, error = %e, "Failed to create repository");
                return Err(e);
            }
        };

        let repository: Repository = serde_json::from_value(value).map_err(|e| {
            error!(name, error = %e, "Created repository has an unexpected shape");
            Error::InvalidResponse
        })?;

        info!(
            name = repository.name.as_str(),
            id = repository.id,
            "Created repository"
        );
        Ok(repository)
    }

    #[instrument(skip(self, content, commit_message), fields(transport = self.transport.name(), bytes = content.len()))]
    async fn upload_file(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        content: &[u8],
        commit_message: Option<&str>,
    ) -> Result<(), Error> {
        let path = path.trim_start_matches('/');
        let message = commit_message
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| default_commit_message(path));

        let request = ApiRequest::WriteFile {
            owner: owner.to_string(),
            repo: repo.to_string(),
            path: path.to_string(),
            payload: FileWritePayload {
                message,
                content: encode_content(content),
                branch: None,
            },
        };

        match self.transport.send(&request).await {
            Ok(_) => {
                debug!(owner, repo, path, "Uploaded file");
                Ok(())
            }
            Err(e) => {
                let (status_code, message) = match e {
                    Error::Remote { status, message } => (status, message),
                    other => (0, other.to_string()),
                };
                warn!(owner, repo, path, status = status_code, "Upload failed");
                Err(Error::Upload {
                    path: path.to_string(),
                    status_code,
                    status_text: reason_phrase(status_code).to_string(),
                    message,
                })
            }
        }
    }
}

/// Creates an upstream octocrab client for a personal access token.
///
/// `base_url` overrides the GitHub API location (GitHub Enterprise, tests).
/// Must be called from within a tokio runtime.
#[instrument(skip(token))]
pub fn create_token_client(token: &str, base_url: Option<&str>) -> Result<Octocrab, Error> {
    if token.trim().is_empty() {
        return Err(Error::AuthError("No access token was provided".to_string()));
    }

    let mut builder = Octocrab::builder().personal_token(token.to_string());
    if let Some(url) = base_url {
        builder = builder.base_uri(url).map_err(|e| {
            error!(base_url = url, error = %e, "Invalid GitHub API base URL");
            Error::AuthError(format!("Invalid GitHub API base URL '{}'", url))
        })?;
    }

    builder.build().map_err(|e| {
        error!(error = %e, "Failed to build GitHub client");
        Error::AuthError("Failed to build GitHub client".to_string())
    })
}

pub(crate) fn log_octocrab_error(message: &str, e: &octocrab::Error) {
    match e {
        octocrab::Error::GitHub { source, .. } => error!(
            status = source.status_code.as_u16(),
            error_message = source.message.as_str(),
            "{}. Received an error from GitHub",
            message
        ),
        octocrab::Error::UriParse { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        octocrab::Error::Uri { source, .. } => error!(
            error_message = source.to_string(),
            "{}. Failed to parse URI.",
            message
        ),
        _ => error!(error_message = e.to_string(), "{}", message),
    };
}
