//! Bulk upload of local files and folders into a repository.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use net_disk_core::{DropPayload, FileHandle, LocalFile, UploadSummary, ViewState};
use tracing::{debug, error, info, instrument, warn};

use crate::{
    errors::Error,
    render::format_upload_summary,
    session::{connect, find_repository, GlobalOptions},
};

#[cfg(test)]
#[path = "upload_cmd_tests.rs"]
mod tests;

/// Upload local files and folders into a repository
#[derive(Args, Debug)]
pub struct UploadArgs {
    /// Repository name
    pub repo: String,

    /// Files and folders to upload; folders keep their structure
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Folder inside the repository to upload into, the root when omitted
    #[arg(long)]
    pub dest: Option<String>,

    /// Skip the confirmation asked for large batches
    #[arg(short, long)]
    pub yes: bool,

    /// Commit message for every file instead of one per file name
    #[arg(short, long)]
    pub message: Option<String>,

    /// Upload plain files only, each at the top of the destination
    #[arg(long)]
    pub flat: bool,
}

#[instrument(skip(options, ask_user_for_value))]
pub async fn execute(
    args: &UploadArgs,
    options: &GlobalOptions,
    ask_user_for_value: &dyn Fn(&str) -> Result<String, Error>,
) -> Result<(), Error> {
    let mut view = connect(options).await?;
    match run(args, &mut view, ask_user_for_value).await? {
        Some(summary) => {
            print!("{}", format_upload_summary(&summary));
            if !summary.is_success() {
                return Err(Error::Remote(format!(
                    "{} of {} files failed to upload",
                    summary.fail_count + summary.unattempted_count,
                    summary.total()
                )));
            }
        }
        None => println!("Nothing uploaded"),
    }
    Ok(())
}

/// Uploads `args.paths` and returns the session summary, `None` when there
/// was nothing to upload or the confirmation was declined.
pub async fn run(
    args: &UploadArgs,
    view: &mut ViewState,
    ask_user_for_value: &dyn Fn(&str) -> Result<String, Error>,
) -> Result<Option<UploadSummary>, Error> {
    let repository = find_repository(view, &args.repo)?;
    view.select_repository(repository).await;
    if let Some(dest) = args.dest.as_deref() {
        view.navigate_to(dest).await;
    }
    debug!(
        repo = args.repo.as_str(),
        dest = view.current_path().as_str(),
        "Upload target"
    );

    let payload = if args.flat {
        flat_payload(&args.paths).await?
    } else {
        DropPayload::from_local_paths(&args.paths).await?
    };

    let skip_confirmation = args.yes;
    let confirm = |count: usize| {
        if skip_confirmation {
            return true;
        }
        match ask_user_for_value(&confirmation_prompt(count)) {
            Ok(answer) => is_yes(&answer),
            Err(e) => {
                warn!(message = "Could not read the confirmation", error = ?e);
                false
            }
        }
    };

    let summary = view.upload(payload, args.message.clone(), confirm).await?;
    if summary.is_none() {
        info!(message = "No files uploaded");
    }
    Ok(summary)
}

/// The question asked before a batch above the confirmation threshold.
pub fn confirmation_prompt(count: usize) -> String {
    format!(
        "About to upload {} files. This can take a long time, possibly hours.\n\n\
         GitHub limits the API request rate:\n\
         - authenticated users: 5000 requests per hour\n\
         - every file takes 1 request\n\n\
         Consider uploading in smaller batches or using git directly.\n\n\
         Continue? [y/N] ",
        count
    )
}

pub(crate) fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

async fn flat_payload(paths: &[PathBuf]) -> Result<DropPayload, Error> {
    let mut files: Vec<Arc<dyn FileHandle>> = Vec::with_capacity(paths.len());
    for path in paths {
        let metadata = tokio::fs::metadata(path).await.map_err(|e| {
            error!(message = "Cannot read file", path = ?path, error = ?e);
            Error::InvalidArguments(format!("Cannot read {}: {}", path.display(), e))
        })?;
        if !metadata.is_file() {
            return Err(Error::InvalidArguments(format!(
                "{} is not a file; --flat accepts files only",
                path.display()
            )));
        }
        files.push(Arc::new(LocalFile::new(file_name(path), path)));
    }
    Ok(DropPayload::Flat(files))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
