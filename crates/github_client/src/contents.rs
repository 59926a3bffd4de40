//! Repository contents domain types.
//!
//! This module contains types for working with GitHub repository contents:
//! the raw [`TreeEntry`] records returned by the Contents API and the
//! presentation-ready [`DirectoryEntry`] rows the rest of the workspace uses.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

#[cfg(test)]
#[path = "contents_tests.rs"]
mod tests;

/// Size label shown for folders.
pub const NOT_APPLICABLE: &str = "-";

/// A single entry in a GitHub repository directory listing, as sent on the
/// wire.
///
/// # Examples
///
/// ```rust
/// use github_client::{TreeEntry, EntryType};
///
/// let entry = TreeEntry {
///     name: "library".to_string(),
///     path: "types/library".to_string(),
///     entry_type: EntryType::Dir,
///     sha: "abc123".to_string(),
///     size: 0,
///     download_url: None,
/// };
///
/// assert!(matches!(entry.entry_type, EntryType::Dir));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Entry name (e.g., "library", "config.toml")
    pub name: String,

    /// Full path within repository (e.g., "types/library")
    pub path: String,

    /// Entry type (file, directory, symlink, submodule)
    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Git SHA of the entry
    #[serde(default)]
    pub sha: String,

    /// Size in bytes (0 for directories)
    #[serde(default)]
    pub size: u64,

    /// Download URL for files (None for directories)
    #[serde(default)]
    pub download_url: Option<String>,
}

/// Type of entry in a repository directory.
///
/// Maps to GitHub's content type field in the Contents API response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Regular file
    File,

    /// Directory (can contain other entries)
    Dir,

    /// Symbolic link
    Symlink,

    /// Git submodule reference
    Submodule,
}

/// How an entry is presented: everything that is not a directory is a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Folder,
    File,
}

/// One row of a directory listing.
///
/// Entries are value objects: a directory load replaces the whole listing, it
/// never patches individual rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    /// Content hash, used as the row identifier
    pub id: String,
    pub name: String,
    pub kind: EntryKind,
    /// Human-readable size, [`NOT_APPLICABLE`] for folders
    pub size: String,
    /// Last-modified label; the Contents API carries no timestamp so this is
    /// [`NOT_APPLICABLE`] for remote listings
    pub modified: String,
    /// Path relative to the repository root
    pub path: String,
}

impl DirectoryEntry {
    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }
}

impl From<TreeEntry> for DirectoryEntry {
    fn from(value: TreeEntry) -> Self {
        let kind = match value.entry_type {
            EntryType::Dir => EntryKind::Folder,
            _ => EntryKind::File,
        };
        let size = match kind {
            EntryKind::Folder => NOT_APPLICABLE.to_string(),
            EntryKind::File => format_size(value.size),
        };

        Self {
            id: value.sha,
            name: value.name,
            kind,
            size,
            modified: NOT_APPLICABLE.to_string(),
            path: value.path,
        }
    }
}

/// Formats a byte count the way the listing displays it.
///
/// Zero is shown as `0 KB`; anything else uses the largest of B/KB/MB/GB that
/// does not exceed the value, with one decimal and a trailing `.0` dropped.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 KB".to_string();
    }

    let mut index = 0;
    let mut value = bytes as f64;
    while value >= 1024.0 && index < UNITS.len() - 1 {
        value /= 1024.0;
        index += 1;
    }

    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{:.0} {}", rounded, UNITS[index])
    } else {
        format!("{:.1} {}", rounded, UNITS[index])
    }
}

/// Presentation order: folders before files, then name ascending.
pub fn compare_entries(a: &DirectoryEntry, b: &DirectoryEntry) -> Ordering {
    a.kind.cmp(&b.kind).then_with(|| compare_names(&a.name, &b.name))
}

/// Dictionary order for names: letters compare without regard to case
/// (`apple`, `Banana`, `notes`, `README`), and names that differ only in case
/// put the lowercase form first.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| b.cmp(a))
}

/// Sorts a listing in presentation order.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(compare_entries);
}

/// Decodes a Contents API payload into a sorted listing.
///
/// Anything that is not an array (a single file object, `null`, a malformed
/// envelope) yields an empty listing. Array items that do not look like
/// entries are skipped.
pub fn decode_listing(payload: serde_json::Value) -> Vec<DirectoryEntry> {
    let serde_json::Value::Array(items) = payload else {
        debug!("Directory payload is not an array, treating it as empty");
        return Vec::new();
    };

    let mut entries: Vec<DirectoryEntry> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<TreeEntry>(item) {
            Ok(entry) => Some(DirectoryEntry::from(entry)),
            Err(e) => {
                debug!(error = %e, "Skipping unrecognised directory entry");
                None
            }
        })
        .collect();

    sort_entries(&mut entries);
    entries
}
