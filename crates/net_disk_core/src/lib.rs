//! # NetDisk Core
//!
//! The workflows behind the GitNetDisk file manager, independent of any front
//! end:
//!
//! - [`traversal`] turns a drop of files and folders into a flat list of
//!   uploads, reading nested folders concurrently.
//! - [`upload`] runs an upload session: filters version-control metadata,
//!   guards large batches behind a confirmation, writes files one at a time,
//!   and stops early when GitHub's rate limit is hit.
//! - [`navigation`] holds what the user is looking at and keeps the folder
//!   listing in sync with every move.
//!
//! All remote access goes through [`github_client::RepositoryClient`], so the
//! workflows can be driven against an in-memory client in tests.
//!
//! ## Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use github_client::{ClientConfig, GitHubClient};
//! use net_disk_core::{DropPayload, ViewState};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = GitHubClient::from_config(&ClientConfig::new("ghp_example"))?;
//! let mut view = ViewState::connect(Arc::new(client)).await?;
//!
//! if let Some(repo) = view.find_repository("notes").cloned() {
//!     view.select_repository(repo).await;
//!     let drop = DropPayload::from_local_paths(&["./photos"]).await?;
//!     if let Some(summary) = view.upload(drop, None, |_| true).await? {
//!         println!("{}", summary.report());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod errors;
pub use errors::{Error, NetDiskResult};

pub mod navigation;
pub use navigation::ViewState;

pub mod traversal;
pub use traversal::{
    collect_uploads, DirectoryHandle, DropPayload, DroppedEntry, EntryReader, FileHandle,
    LocalDirectory, LocalFile, PendingUpload, LOCAL_READ_BATCH_SIZE,
};

pub mod upload;
pub use upload::{
    is_reserved_path, BatchUploader, ItemOutcome, UploadOutcome, UploadPolicy, UploadSummary,
    UploadTarget, DEFAULT_CONFIRMATION_THRESHOLD, DEFAULT_FAILED_PATH_DISPLAY_LIMIT,
};

#[cfg(test)]
mod test_support;
