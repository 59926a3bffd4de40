//! # Models
//!
//! This module contains the data models exchanged with the GitHub API: the
//! authenticated identity, repositories, and the request payloads for creating a
//! repository and writing a file.
//!
//! Wire records are decoded leniently (missing optional fields fall back to
//! sensible defaults) because the intermediary service and the upstream API do
//! not always emit the same set of fields.

use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "models_tests.rs"]
mod tests;

/// The GitHub account the credential belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    /// The unique numeric ID of the account
    pub id: u64,
    /// The login name of the account, used as the repository owner
    pub login: String,
    /// Avatar image URL
    #[serde(default)]
    pub avatar_url: String,
}

/// A repository owned by, or accessible to, the authenticated user.
///
/// Repositories are immutable once fetched; identity is the `id` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "RepositoryRecord")]
pub struct Repository {
    /// The unique numeric ID of the repository
    pub id: u64,
    /// Repository name (without owner)
    pub name: String,
    /// Description, empty when the repository has none
    pub description: String,
    /// Whether the repository is private
    pub private: bool,
    /// Primary language label, `"Text"` when GitHub reports none
    pub language: String,
    /// Last update timestamp as reported by GitHub (RFC 3339)
    pub updated_at: String,
    /// Canonical web URL
    pub html_url: String,
    /// Default branch, `"main"` when not reported
    pub default_branch: String,
}

impl Repository {
    /// Returns the date part of the last update timestamp, e.g. `2024-05-01`.
    pub fn updated_date(&self) -> &str {
        self.updated_at
            .split('T')
            .next()
            .unwrap_or(self.updated_at.as_str())
    }

    /// Returns `"private"` or `"public"`.
    pub fn visibility(&self) -> &'static str {
        if self.private {
            "private"
        } else {
            "public"
        }
    }
}

#[derive(Deserialize)]
struct RepositoryRecord {
    id: u64,
    name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    updated_at: Option<String>,
    #[serde(default)]
    html_url: Option<String>,
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<RepositoryRecord> for Repository {
    fn from(value: RepositoryRecord) -> Self {
        Self {
            id: value.id,
            name: value.name,
            description: value.description.unwrap_or_default(),
            private: value.private,
            language: value
                .language
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| "Text".to_string()),
            updated_at: value.updated_at.unwrap_or_default(),
            html_url: value.html_url.unwrap_or_default(),
            default_branch: value
                .default_branch
                .filter(|b| !b.is_empty())
                .unwrap_or_else(|| "main".to_string()),
        }
    }
}

/// Represents the payload for creating a new repository for the authenticated
/// user.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct RepositoryCreatePayload {
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub private: bool,

    /// Create an initial commit with a README
    #[serde(default)]
    pub auto_init: bool,
}

/// Body of a create-or-update file write.
///
/// No `sha` is sent: the remote decides between create and update.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FileWritePayload {
    /// Commit message
    pub message: String,

    /// File content, base64 encoded
    pub content: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,
}
