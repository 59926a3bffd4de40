use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors raised by the file-manager workflows.
#[derive(Error, Debug)]
pub enum Error {
    /// A remote call failed.
    #[error(transparent)]
    Client(#[from] github_client::Error),

    /// A dropped file or directory could not be read.
    #[error("Failed to read '{path}': {reason}")]
    Traversal { path: String, reason: String },

    /// An operation needs a selected repository and none is selected.
    #[error("No repository is selected")]
    NoRepositorySelected,
}

impl Error {
    pub fn traversal(path: impl Into<String>, reason: impl ToString) -> Self {
        Error::Traversal {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Convenience alias used across the crate.
pub type NetDiskResult<T> = Result<T, Error>;
