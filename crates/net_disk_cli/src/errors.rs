use std::io;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the net-disk CLI application.
///
/// This enum represents all possible error conditions that can arise during
/// CLI operations, including authentication failures, configuration issues,
/// remote failures and I/O problems.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable token, or GitHub rejected it.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The configuration file could not be read, parsed, or written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid command-line arguments were provided.
    ///
    /// Also used for names that do not resolve, such as an unknown repository.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// A call to GitHub or the intermediary failed.
    #[error("Remote error: {0}")]
    Remote(String),

    /// Reading local files or the terminal failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failed to flush the standard output buffer.
    ///
    /// This error occurs when the CLI cannot write output to the terminal,
    /// typically due to broken pipes or terminal issues.
    #[error("Failed to flush the std out buffer.")]
    StdOutFlushFailed,
}

impl From<github_client::Error> for Error {
    fn from(value: github_client::Error) -> Self {
        match value {
            github_client::Error::AuthError(message) => Error::Auth(message),
            e => Error::InvalidArguments(e.to_string()),
        }
    }
}

impl From<net_disk_core::Error> for Error {
    fn from(value: net_disk_core::Error) -> Self {
        match value {
            net_disk_core::Error::Client(e) => e.into(),
            net_disk_core::Error::NoRepositorySelected => {
                Error::InvalidArguments("No repository is selected".to_string())
            }
            e @ net_disk_core::Error::Traversal { .. } => Error::InvalidArguments(e.to_string()),
        }
    }
}
