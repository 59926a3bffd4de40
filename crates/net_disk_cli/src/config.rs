//! Configuration management for the net-disk CLI.
//!
//! The configuration is stored in TOML format and can be loaded from a
//! specified file path or from the default location in the current directory.
//! A missing file is not an error: every setting has a default.
//!
//! The access token never lives in this file; see
//! [`crate::commands::auth_cmd`] for how it is stored.

use std::{
    fs,
    path::{Path, PathBuf},
};

use github_client::{ClientConfig, DEFAULT_INTERMEDIARY_URL, DEFAULT_UPSTREAM_URL};
use net_disk_core::UploadPolicy;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Error;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILENAME: &str = "config.toml";

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;

/// Main configuration structure for the net-disk CLI application.
///
/// # Example TOML Configuration
///
/// ```toml
/// api_base_url = "https://api.github.com"
///
/// [intermediary]
/// enabled = true
/// endpoint = "http://localhost:3000"
///
/// [proxy]
/// enabled = false
/// url = ""
///
/// [upload]
/// confirmation_threshold = 500
/// failed_path_display_limit = 10
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the GitHub REST API
    #[serde(default = "AppConfig::default_api_base_url")]
    pub api_base_url: String,

    #[serde(default)]
    pub intermediary: IntermediaryConfig,

    #[serde(default)]
    pub proxy: ProxyConfig,

    #[serde(default)]
    pub upload: UploadPolicy,
}

impl AppConfig {
    fn default_api_base_url() -> String {
        DEFAULT_UPSTREAM_URL.to_string()
    }

    /// Loads configuration from a TOML file, or the defaults when the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file exists but cannot be read or
    /// contains invalid TOML.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading configuration from {:?}", path);

        if !path.exists() {
            debug!("No configuration file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read configuration file: {}", e)))?;

        let config: AppConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse configuration file: {}", e)))?;

        Ok(config)
    }

    /// Saves the configuration to a TOML file, creating parent directories
    /// as needed and overwriting any existing file.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        debug!("Saving configuration to {:?}", path);

        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize configuration: {}", e)))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::Config(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(path, content)
            .map_err(|e| Error::Config(format!("Failed to write configuration file: {}", e)))?;

        info!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Builds the client configuration for `token`.
    pub fn client_config(&self, token: &str) -> ClientConfig {
        let mut config = ClientConfig::new(token).with_upstream_url(self.api_base_url.clone());
        if self.intermediary.enabled {
            config = config.with_intermediary(Some(self.intermediary.endpoint.clone()));
        }
        if self.proxy.enabled {
            config = config.with_proxy_url(Some(self.proxy.url.clone()));
        }
        config
    }

    /// Reads a setting by its dotted key.
    pub fn get_value(&self, key: &str) -> Result<String, Error> {
        let value = match key {
            "api_base_url" => self.api_base_url.clone(),
            "intermediary.enabled" => self.intermediary.enabled.to_string(),
            "intermediary.endpoint" => self.intermediary.endpoint.clone(),
            "proxy.enabled" => self.proxy.enabled.to_string(),
            "proxy.url" => self.proxy.url.clone(),
            "upload.confirmation_threshold" => self.upload.confirmation_threshold.to_string(),
            "upload.failed_path_display_limit" => {
                self.upload.failed_path_display_limit.to_string()
            }
            _ => {
                return Err(Error::InvalidArguments(format!(
                    "Invalid configuration key: {}",
                    key
                )))
            }
        };
        Ok(value)
    }

    /// Updates a setting by its dotted key.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), Error> {
        match key {
            "api_base_url" => self.api_base_url = value.to_string(),
            "intermediary.enabled" => self.intermediary.enabled = parse_bool(key, value)?,
            "intermediary.endpoint" => self.intermediary.endpoint = value.to_string(),
            "proxy.enabled" => self.proxy.enabled = parse_bool(key, value)?,
            "proxy.url" => self.proxy.url = value.to_string(),
            "upload.confirmation_threshold" => {
                self.upload.confirmation_threshold = parse_count(key, value)?
            }
            "upload.failed_path_display_limit" => {
                self.upload.failed_path_display_limit = parse_count(key, value)?
            }
            _ => {
                return Err(Error::InvalidArguments(format!(
                    "Invalid configuration key: {}",
                    key
                )))
            }
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::default_api_base_url(),
            intermediary: IntermediaryConfig::default(),
            proxy: ProxyConfig::default(),
            upload: UploadPolicy::default(),
        }
    }
}

/// Routing through the intermediary service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediaryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "IntermediaryConfig::default_endpoint")]
    pub endpoint: String,
}

impl IntermediaryConfig {
    fn default_endpoint() -> String {
        DEFAULT_INTERMEDIARY_URL.to_string()
    }
}

impl Default for IntermediaryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: Self::default_endpoint(),
        }
    }
}

/// Egress proxy the intermediary should use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default)]
    pub url: String,
}

fn parse_bool(key: &str, value: &str) -> Result<bool, Error> {
    value.parse().map_err(|_| {
        Error::InvalidArguments(format!("{} expects true or false, got '{}'", key, value))
    })
}

fn parse_count(key: &str, value: &str) -> Result<usize, Error> {
    value.parse().map_err(|_| {
        Error::InvalidArguments(format!(
            "{} expects a non-negative number, got '{}'",
            key, value
        ))
    })
}

/// Resolves the path to the configuration file.
///
/// If `config_path` is `Some`, that path is used; otherwise `config.toml` in
/// the current directory.
pub fn get_config_path(config_path: Option<&str>) -> PathBuf {
    if let Some(path) = config_path {
        PathBuf::from(path)
    } else {
        let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        current_dir.join(DEFAULT_CONFIG_FILENAME)
    }
}
