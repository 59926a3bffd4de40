use clap::Args;
use net_disk_core::ViewState;
use tracing::instrument;

use crate::{
    errors::Error,
    render::{format_breadcrumbs, format_listing},
    session::{connect, find_repository, GlobalOptions},
};

#[cfg(test)]
#[path = "ls_cmd_tests.rs"]
mod tests;

/// List one folder of a repository
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Repository name
    pub repo: String,

    /// Folder inside the repository, the root when omitted
    pub path: Option<String>,
}

#[instrument(skip(options))]
pub async fn execute(args: &LsArgs, options: &GlobalOptions) -> Result<(), Error> {
    let mut view = connect(options).await?;
    print!("{}", run(args, &mut view).await?);
    Ok(())
}

pub async fn run(args: &LsArgs, view: &mut ViewState) -> Result<String, Error> {
    let repository = find_repository(view, &args.repo)?;
    view.select_repository(repository).await;
    if let Some(path) = args.path.as_deref().filter(|p| !p.trim_matches('/').is_empty()) {
        view.navigate_to(path).await;
    }

    Ok(format!(
        "{}\n{}",
        format_breadcrumbs(&args.repo, view.path_segments()),
        format_listing(view.listing())
    ))
}
