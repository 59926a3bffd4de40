//! Repository list and creation.

use clap::Subcommand;
use net_disk_core::ViewState;
use tracing::{error, info, instrument};

use crate::{
    errors::Error,
    render::format_repositories,
    session::{connect, GlobalOptions},
};

#[cfg(test)]
#[path = "repos_cmd_tests.rs"]
mod tests;

#[derive(Subcommand, Debug)]
pub enum ReposCommands {
    /// List your repositories, most recently updated first
    List,

    /// Create a repository
    Create {
        name: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Make the repository private
        #[arg(long)]
        private: bool,

        /// Skip the initial commit with a README
        #[arg(long)]
        no_readme: bool,
    },
}

#[instrument(skip(options))]
pub async fn execute(cmd: &ReposCommands, options: &GlobalOptions) -> Result<(), Error> {
    let mut view = connect(options).await?;
    println!("{}", run(cmd, &mut view).await?);
    Ok(())
}

pub async fn run(cmd: &ReposCommands, view: &mut ViewState) -> Result<String, Error> {
    match cmd {
        ReposCommands::List => Ok(format_repositories(view.repositories())),
        ReposCommands::Create {
            name,
            description,
            private,
            no_readme,
        } => create(view, name, description, *private, !*no_readme).await,
    }
}

/// Creates a repository and leaves it selected in `view`.
pub async fn create(
    view: &mut ViewState,
    name: &str,
    description: &str,
    private: bool,
    auto_init: bool,
) -> Result<String, Error> {
    let name = name.trim();
    if name.is_empty() {
        let err = Error::InvalidArguments("Repository name is required".to_string());
        error!(message = "Repository name is required", error = ?err);
        return Err(err);
    }

    let repository = view
        .create_repository(name, description.trim(), private, auto_init)
        .await?;
    info!(message = "Repository created", name = repository.name.as_str());

    let mut output = format!(
        "Created {} repository {}",
        repository.visibility(),
        repository.name
    );
    if !repository.html_url.is_empty() {
        output.push_str(&format!("\n{}", repository.html_url));
    }
    Ok(output)
}
