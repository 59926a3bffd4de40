//! Authentication commands.
//!
//! `login` validates a personal access token against GitHub before storing
//! it in the system keyring, so a stored token always belonged to a real
//! account at the time it was saved. The token is never written to the
//! configuration file.

use clap::Subcommand;
use github_client::{GitHubClient, Identity, RepositoryClient};
use keyring::Entry;
use tracing::{debug, error, info, instrument};

use crate::{
    config::AppConfig,
    errors::Error,
    session::{load_stored_token, resolve_token, GlobalOptions, TOKEN_ENV_VAR},
};

pub const KEY_RING_SERVICE_NAME: &str = "net_disk_cli";
pub const KEY_RING_USER_TOKEN: &str = "github_token";

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;

/// Authentication subcommands.
#[derive(Subcommand, Debug)]
pub enum AuthCommands {
    /// Validate a GitHub personal access token and store it in the system keyring
    Login {
        /// Token to store; prompted for when omitted
        #[arg(long)]
        token: Option<String>,
    },

    /// Remove the stored token from the system keyring
    Logout,

    /// Show which account the current token belongs to
    Status,
}

/// Executes the specified authentication command.
#[instrument(skip(options, ask_user_for_value))]
pub async fn execute(
    cmd: &AuthCommands,
    options: &GlobalOptions,
    ask_user_for_value: &dyn Fn(&str) -> Result<String, Error>,
) -> Result<(), Error> {
    let config = options.load_config()?;

    match cmd {
        AuthCommands::Login { token } => {
            let token = match token.as_deref().or(options.token.as_deref()) {
                Some(t) => t.to_string(),
                None => ask_user_for_value("GitHub personal access token: ")?,
            };
            let identity = login(&config, &token, store_token).await?;
            println!("Logged in as {}", identity.login);
        }
        AuthCommands::Logout => {
            logout()?;
            println!("Stored token removed");
        }
        AuthCommands::Status => {
            let token = resolve_token(
                options.token.as_deref(),
                std::env::var(TOKEN_ENV_VAR).ok(),
                load_stored_token,
            )?;
            println!("{}", status(&config, &token).await?);
        }
    }

    Ok(())
}

/// Checks `token` against GitHub and hands it to `store` only if GitHub
/// accepts it.
pub async fn login<S>(config: &AppConfig, token: &str, store: S) -> Result<Identity, Error>
where
    S: FnOnce(&str) -> Result<(), Error>,
{
    let token = token.trim();
    if token.is_empty() {
        let err = Error::Auth("Token cannot be empty".to_string());
        error!(message = "Token cannot be empty", error = ?err);
        return Err(err);
    }

    let identity = validate_token(config, token).await?;
    store(token)?;
    info!(
        message = "Stored token",
        login = identity.login.as_str()
    );
    Ok(identity)
}

/// Describes the account behind `token` and how requests will be routed.
pub async fn status(config: &AppConfig, token: &str) -> Result<String, Error> {
    let client = GitHubClient::from_config(&config.client_config(token))?;
    let identity = client.fetch_current_user().await?;

    let mut output = format!("Logged in as {} (id {})", identity.login, identity.id);
    if config.intermediary.enabled {
        output.push_str(&format!(
            "\nRequests are routed through {}",
            config.intermediary.endpoint
        ));
    }
    Ok(output)
}

async fn validate_token(config: &AppConfig, token: &str) -> Result<Identity, Error> {
    let client = GitHubClient::from_config(&config.client_config(token))?;
    let identity = client.fetch_current_user().await?;
    debug!(message = "Token accepted", login = identity.login.as_str());
    Ok(identity)
}

fn store_token(token: &str) -> Result<(), Error> {
    let keyring = Entry::new(KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN)
        .map_err(|e| Error::Auth(format!("Failed to create an entry in the keyring: {}", e)))?;
    keyring
        .set_password(token)
        .map_err(|e| Error::Auth(format!("Failed to save token to keyring: {}", e)))?;
    debug!(message = "Saved token to keyring");
    Ok(())
}

fn logout() -> Result<(), Error> {
    let keyring = Entry::new(KEY_RING_SERVICE_NAME, KEY_RING_USER_TOKEN)
        .map_err(|e| Error::Auth(format!("Failed to create an entry in the keyring: {}", e)))?;
    match keyring.delete_credential() {
        Ok(()) | Err(keyring::Error::NoEntry) => {
            debug!(message = "Removed token from keyring");
            Ok(())
        }
        Err(e) => Err(Error::Auth(format!(
            "Failed to remove token from keyring: {}",
            e
        ))),
    }
}
