//! Batch upload orchestration.
//!
//! One upload session takes the files collected from a drop, filters out
//! version-control metadata, asks for confirmation when the batch is large,
//! writes each file with its own remote call, and summarises what happened.
//! Files are written strictly one at a time. A rate-limit failure stops the
//! session; every other failure is recorded and the session moves on.

use std::time::{Duration, Instant};

use github_client::RepositoryClient;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::traversal::PendingUpload;

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;

/// Batches larger than this need explicit confirmation.
pub const DEFAULT_CONFIRMATION_THRESHOLD: usize = 500;

/// Failed paths are listed in the report only up to this many failures.
pub const DEFAULT_FAILED_PATH_DISPLAY_LIMIT: usize = 10;

/// A progress line is logged every this many files.
pub const PROGRESS_LOG_INTERVAL: usize = 50;

/// Path segment that is never uploaded.
pub const RESERVED_SEGMENT: &str = ".git";

/// Tunables for an upload session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadPolicy {
    pub confirmation_threshold: usize,
    pub failed_path_display_limit: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            failed_path_display_limit: DEFAULT_FAILED_PATH_DISPLAY_LIMIT,
        }
    }
}

/// Returns `true` if any `/`-separated segment of `path` is `.git`, ignoring
/// ASCII case.
pub fn is_reserved_path(path: &str) -> bool {
    path.split('/')
        .any(|segment| segment.eq_ignore_ascii_case(RESERVED_SEGMENT))
}

/// Where a session writes to, captured once when the session starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTarget {
    pub owner: String,
    pub repository: String,
    /// Folder names from the repository root; empty for the root itself
    pub directory: Vec<String>,
}

impl UploadTarget {
    pub fn new(owner: impl Into<String>, repository: impl Into<String>, directory: Vec<String>) -> Self {
        Self {
            owner: owner.into(),
            repository: repository.into(),
            directory,
        }
    }

    /// Repository path for a file given relative to the target directory.
    pub fn absolute_path(&self, relative_path: &str) -> String {
        if self.directory.is_empty() {
            relative_path.to_string()
        } else {
            format!("{}/{}", self.directory.join("/"), relative_path)
        }
    }
}

/// Result of writing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Succeeded,
    Failed(String),
}

/// One attempted file and how it went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    /// Path relative to the upload target
    pub path: String,
    pub outcome: UploadOutcome,
}

/// Aggregate result of an upload session.
///
/// `success_count + fail_count + skipped_count + unattempted_count` always
/// equals the number of files in the drop. `unattempted_count` is only
/// non-zero when the session stopped on a rate limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    pub success_count: usize,
    pub fail_count: usize,
    pub skipped_count: usize,
    pub unattempted_count: usize,
    /// Relative paths of failed files, at most `failed_path_display_limit` of them
    pub failed_paths: Vec<String>,
    pub elapsed: Duration,
    pub rate_limited: bool,
    /// Every attempted file in attempt order
    pub outcomes: Vec<ItemOutcome>,
    failed_path_display_limit: usize,
}

impl UploadSummary {
    fn new(skipped_count: usize, failed_path_display_limit: usize) -> Self {
        Self {
            success_count: 0,
            fail_count: 0,
            skipped_count,
            unattempted_count: 0,
            failed_paths: Vec::new(),
            elapsed: Duration::ZERO,
            rate_limited: false,
            outcomes: Vec::new(),
            failed_path_display_limit,
        }
    }

    /// Number of files in the drop, filtered ones included.
    pub fn total(&self) -> usize {
        self.success_count + self.fail_count + self.skipped_count + self.unattempted_count
    }

    pub fn is_success(&self) -> bool {
        self.fail_count == 0 && !self.rate_limited
    }

    /// The human-readable session report.
    pub fn report(&self) -> String {
        let mut report = format!(
            "Upload complete!\nSucceeded: {}\nFailed: {}",
            self.success_count, self.fail_count
        );
        if self.skipped_count > 0 {
            report.push_str(&format!(
                "\nSkipped: {} ({} files)",
                self.skipped_count, RESERVED_SEGMENT
            ));
        }
        report.push_str(&format!("\nElapsed: {} s", self.elapsed.as_secs_f64().round()));

        if self.fail_count >= 1 && self.fail_count <= self.failed_path_display_limit {
            report.push_str("\n\nFailed files:\n");
            report.push_str(&self.failed_paths.join("\n"));
        }
        report
    }

    /// The notice shown when the session stopped on a rate limit.
    pub fn rate_limit_notice(&self) -> Option<String> {
        self.rate_limited.then(|| {
            format!(
                "GitHub API rate limit reached!\nUploaded {} files before stopping.\nWait an hour before continuing.",
                self.success_count
            )
        })
    }
}

/// Runs upload sessions against one repository client.
pub struct BatchUploader<'a> {
    client: &'a dyn RepositoryClient,
    policy: UploadPolicy,
    commit_message: Option<String>,
}

impl<'a> BatchUploader<'a> {
    pub fn new(client: &'a dyn RepositoryClient, policy: UploadPolicy) -> Self {
        Self {
            client,
            policy,
            commit_message: None,
        }
    }

    /// Uses the same commit message for every file instead of the per-file
    /// default.
    pub fn with_commit_message(mut self, message: Option<String>) -> Self {
        self.commit_message = message.filter(|m| !m.trim().is_empty());
        self
    }

    /// Uploads `items` under `target`.
    ///
    /// `confirm` is called with the number of files to upload when that number
    /// exceeds the policy's confirmation threshold. Returns `None` when there
    /// was nothing to do or the user declined; no remote call is made in
    /// either case.
    #[instrument(skip(self, items, confirm), fields(owner = %target.owner, repo = %target.repository, items = items.len()))]
    pub async fn run<F>(
        &self,
        target: &UploadTarget,
        items: Vec<PendingUpload>,
        confirm: F,
    ) -> Option<UploadSummary>
    where
        F: FnOnce(usize) -> bool,
    {
        if items.is_empty() {
            debug!("Nothing to upload");
            return None;
        }

        let (accepted, skipped): (Vec<PendingUpload>, Vec<PendingUpload>) = items
            .into_iter()
            .partition(|item| !is_reserved_path(&item.relative_path));
        for item in &skipped {
            debug!(path = item.relative_path.as_str(), "Skipping version-control file");
        }
        if !skipped.is_empty() {
            info!(skipped = skipped.len(), "Skipped {} files", RESERVED_SEGMENT);
        }

        let total = accepted.len();
        if total > self.policy.confirmation_threshold && !confirm(total) {
            info!(count = total, "Upload declined");
            return None;
        }

        let started = Instant::now();
        let mut summary = UploadSummary::new(skipped.len(), self.policy.failed_path_display_limit);
        let mut remaining = accepted.into_iter();

        let mut index = 0usize;
        while let Some(item) = remaining.next() {
            if index % PROGRESS_LOG_INTERVAL == 0 {
                info!(done = index, total, "Upload progress");
            }
            index += 1;

            let path = target.absolute_path(&item.relative_path);
            let result = match item.content.read().await {
                Ok(content) => self
                    .client
                    .upload_file(
                        &target.owner,
                        &target.repository,
                        &path,
                        &content,
                        self.commit_message.as_deref(),
                    )
                    .await
                    .map_err(|e| (e.is_rate_limited(), e.to_string())),
                Err(e) => Err((false, e.to_string())),
            };

            match result {
                Ok(()) => {
                    summary.success_count += 1;
                    summary.outcomes.push(ItemOutcome {
                        path: item.relative_path,
                        outcome: UploadOutcome::Succeeded,
                    });
                }
                Err((rate_limited, reason)) => {
                    warn!(path = path.as_str(), reason = reason.as_str(), "Failed to upload file");
                    summary.fail_count += 1;
                    if summary.failed_paths.len() < self.policy.failed_path_display_limit {
                        summary.failed_paths.push(item.relative_path.clone());
                    }
                    summary.outcomes.push(ItemOutcome {
                        path: item.relative_path,
                        outcome: UploadOutcome::Failed(reason),
                    });

                    if rate_limited {
                        summary.rate_limited = true;
                        summary.unattempted_count = remaining.len();
                        warn!(
                            uploaded = summary.success_count,
                            unattempted = summary.unattempted_count,
                            "Rate limit reached, stopping upload"
                        );
                        break;
                    }
                }
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            succeeded = summary.success_count,
            failed = summary.fail_count,
            skipped = summary.skipped_count,
            unattempted = summary.unattempted_count,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Upload session finished"
        );
        Some(summary)
    }
}
