use std::path::Path;

use clap::Subcommand;
use tracing::{debug, error, info, instrument};

use crate::config::{get_config_path, AppConfig};
use crate::errors::Error;

#[cfg(test)]
#[path = "config_cmd_tests.rs"]
mod tests;

/// Subcommands for the config command
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Create an initial configuration file with the default settings
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the configuration in effect
    Show,

    /// Show one configuration value (e.g., "upload.confirmation_threshold")
    Get { key: String },

    /// Update one configuration value
    Set {
        /// Configuration key to set (e.g., "intermediary.enabled")
        key: String,

        /// Value to set
        value: String,
    },
}

/// Execute the config command against the file at `config_path`.
#[instrument]
pub async fn execute(cmd: &ConfigCommands, config_path: Option<&str>) -> Result<(), Error> {
    let path = get_config_path(config_path);
    match cmd {
        ConfigCommands::Init { force } => {
            init_config(&path, *force)?;
            println!("Configuration file created at {}", path.display());
        }
        ConfigCommands::Show => println!("{}", show_config(&path)?),
        ConfigCommands::Get { key } => println!("{}", AppConfig::load(&path)?.get_value(key)?),
        ConfigCommands::Set { key, value } => {
            set_config(&path, key, value)?;
            println!("Updated {} = {}", key, value);
        }
    }
    Ok(())
}

/// Writes the default configuration to `path`.
pub fn init_config(path: &Path, force: bool) -> Result<(), Error> {
    debug!(message = "Initializing configuration", path = ?path);

    if path.exists() && !force {
        let err = Error::Config(format!(
            "Configuration file already exists at {}",
            path.display()
        ));
        error!(message = "Configuration file already exists", path = ?path, error = ?err);
        return Err(err);
    }

    AppConfig::default().save(path)?;
    info!(message = "Configuration initialized", path = ?path);
    Ok(())
}

/// The configuration in effect at `path`, as TOML.
pub fn show_config(path: &Path) -> Result<String, Error> {
    let config = AppConfig::load(path)?;
    toml::to_string_pretty(&config)
        .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))
}

/// Sets one value and saves the file, creating it if needed.
pub fn set_config(path: &Path, key: &str, value: &str) -> Result<(), Error> {
    let mut config = AppConfig::load(path)?;
    config.set_value(key, value).inspect_err(|e| {
        error!(message = "Failed to update configuration", key = key, error = ?e);
    })?;
    config.save(path)?;
    info!(message = "Configuration updated", key = key);
    Ok(())
}
