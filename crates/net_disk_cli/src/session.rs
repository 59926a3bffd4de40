//! Login for the commands that talk to GitHub.
//!
//! A token is taken from the `--token` flag, then the `GITHUB_TOKEN`
//! environment variable, then the system keyring. Nothing is cached between
//! runs besides the keyring entry written by `auth login`.

use std::sync::Arc;

use github_client::GitHubClient;
use keyring::Entry;
use net_disk_core::ViewState;
use tracing::{debug, instrument};

use crate::{
    commands::auth_cmd::{KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN},
    config::{get_config_path, AppConfig},
    errors::Error,
};

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;

/// Environment variable consulted when no `--token` flag is given.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Options shared by every command.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Path to the configuration file, `config.toml` in the working
    /// directory when unset
    pub config: Option<String>,

    /// Token that overrides the environment and the keyring
    pub token: Option<String>,
}

impl GlobalOptions {
    pub fn load_config(&self) -> Result<AppConfig, Error> {
        AppConfig::load(&get_config_path(self.config.as_deref()))
    }
}

/// Picks the first non-blank token from the flag, the environment, and the
/// store, in that order. The store is only consulted when needed.
pub fn resolve_token<S>(
    flag: Option<&str>,
    env: Option<String>,
    stored: S,
) -> Result<String, Error>
where
    S: FnOnce() -> Result<Option<String>, Error>,
{
    let non_blank = |t: &str| !t.trim().is_empty();

    if let Some(token) = flag.filter(|t| non_blank(t)) {
        debug!("Using token from the command line");
        return Ok(token.trim().to_string());
    }
    if let Some(token) = env.filter(|t| non_blank(t)) {
        debug!("Using token from {}", TOKEN_ENV_VAR);
        return Ok(token.trim().to_string());
    }
    match stored()? {
        Some(token) if non_blank(&token) => {
            debug!("Using token from the keyring");
            Ok(token)
        }
        _ => Err(Error::Auth(
            "No GitHub token found. Run `net-disk auth login` or set GITHUB_TOKEN.".to_string(),
        )),
    }
}

/// Reads the token saved by `auth login`, `None` when there is none.
pub fn load_stored_token() -> Result<Option<String>, Error> {
    let entry = Entry::new(KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN)
        .map_err(|e| Error::Auth(format!("Failed to open the keyring entry: {}", e)))?;
    match entry.get_password() {
        Ok(token) => Ok(Some(token)),
        Err(keyring::Error::NoEntry) => Ok(None),
        Err(e) => Err(Error::Auth(format!(
            "Failed to read the token from the keyring: {}",
            e
        ))),
    }
}

/// Connects to GitHub as the owner of `token`, with the repository list
/// loaded and the upload policy taken from `config`.
#[instrument(skip(config, token))]
pub async fn open_session(config: &AppConfig, token: &str) -> Result<ViewState, Error> {
    let client = GitHubClient::from_config(&config.client_config(token))?;
    debug!(transport = client.transport_name(), "Connecting");
    let view = ViewState::connect(Arc::new(client)).await?;
    Ok(view.with_policy(config.upload))
}

/// Loads the configuration, finds a token, and connects.
pub async fn connect(options: &GlobalOptions) -> Result<ViewState, Error> {
    let config = options.load_config()?;
    let token = resolve_token(
        options.token.as_deref(),
        std::env::var(TOKEN_ENV_VAR).ok(),
        load_stored_token,
    )?;
    open_session(&config, &token).await
}

/// Looks up a repository by name, failing with a message that lists nothing
/// more than the name given.
pub fn find_repository(view: &ViewState, name: &str) -> Result<github_client::Repository, Error> {
    view.find_repository(name)
        .cloned()
        .ok_or_else(|| Error::InvalidArguments(format!("Repository '{}' not found", name)))
}
