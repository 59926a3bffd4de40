//! Interactive browsing session.
//!
//! Keeps one [`ViewState`] alive for the whole session so that moving around
//! a repository, renaming entries, and uploading all act on the same view.
//! Renames only change what this session shows; the remote file keeps its
//! name.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use colored::Colorize;
use net_disk_core::{DropPayload, ViewState};
use tracing::{debug, instrument, warn};

use crate::{
    commands::{
        repos_cmd,
        upload_cmd::{confirmation_prompt, is_yes},
    },
    errors::Error,
    render::{format_breadcrumbs, format_listing, format_repositories, format_upload_summary},
    session::{connect, find_repository, GlobalOptions},
};

#[cfg(test)]
#[path = "browse_cmd_tests.rs"]
mod tests;

pub const HELP_TEXT: &str = "\
Commands:
  repos                      list your repositories
  open <repo>                open a repository at its root
  close                      go back to the repository list
  create <name> [private]    create a repository and open it
  ls                         list the current folder
  cd <folder>|..|/|<a/b>     change folder; a/b is relative, /a/b from the root
  crumb <n>                  jump to breadcrumb n as shown by pwd
  pwd                        show where you are
  rename <name> <new name>   rename an entry in this view only
  upload <path>...           upload files and folders into the current folder
  help                       show this help
  exit                       leave";

/// One line typed at the browse prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseCommand {
    Repos,
    Open(String),
    Close,
    Create { name: String, private: bool },
    List,
    ChangeDirectory(String),
    Crumb(usize),
    Pwd,
    Rename { from: String, to: String },
    Upload(Vec<PathBuf>),
    Help,
    Exit,
    Empty,
}

/// What the loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Flow {
    Continue(String),
    Exit,
}

#[instrument(skip(options, ask_user_for_value))]
pub async fn execute(
    options: &GlobalOptions,
    ask_user_for_value: &dyn Fn(&str) -> Result<String, Error>,
) -> Result<(), Error> {
    let mut view = connect(options).await?;
    println!(
        "Logged in as {}. Type {} for commands.",
        view.owner().unwrap_or_default().bold(),
        "help".bold()
    );
    println!("{}", format_repositories(view.repositories()));

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{} ", prompt(&view));
        io::stdout().flush().map_err(|_| Error::StdOutFlushFailed)?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line?;

        let outcome = match parse_browse_command(&line) {
            Ok(cmd) => apply(&mut view, cmd, ask_user_for_value).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(Flow::Continue(output)) if output.is_empty() => {}
            Ok(Flow::Continue(output)) => println!("{}", output.trim_end()),
            Ok(Flow::Exit) => break,
            Err(e) => {
                warn!(message = "Browse command failed", error = ?e);
                eprintln!("{}", e.to_string().red());
            }
        }
    }
    Ok(())
}

fn prompt(view: &ViewState) -> String {
    match view.selected_repository() {
        Some(repo) => format!(
            "{}{}",
            format_breadcrumbs(&repo.name, view.path_segments()),
            ">".bold()
        ),
        None => "net-disk>".bold().to_string(),
    }
}

/// Parses one input line.
pub fn parse_browse_command(line: &str) -> Result<BrowseCommand, Error> {
    let args = split_arguments(line)?;
    let Some((name, rest)) = args.split_first() else {
        return Ok(BrowseCommand::Empty);
    };

    let usage = |text: &str| Error::InvalidArguments(format!("Usage: {}", text));
    let command = match (name.as_str(), rest) {
        ("repos", []) => BrowseCommand::Repos,
        ("open", [repo]) => BrowseCommand::Open(repo.clone()),
        ("open", _) => return Err(usage("open <repo>")),
        ("close", []) => BrowseCommand::Close,
        ("create", [name]) => BrowseCommand::Create {
            name: name.clone(),
            private: false,
        },
        ("create", [name, flag]) if flag == "private" => BrowseCommand::Create {
            name: name.clone(),
            private: true,
        },
        ("create", _) => return Err(usage("create <name> [private]")),
        ("ls", []) => BrowseCommand::List,
        ("cd", []) => BrowseCommand::ChangeDirectory("/".to_string()),
        ("cd", [target]) => BrowseCommand::ChangeDirectory(target.clone()),
        ("cd", _) => return Err(usage("cd <folder>")),
        ("crumb", [index]) => BrowseCommand::Crumb(
            index
                .parse()
                .map_err(|_| usage("crumb <n>, where n is a breadcrumb number"))?,
        ),
        ("crumb", _) => return Err(usage("crumb <n>")),
        ("pwd", []) => BrowseCommand::Pwd,
        ("rename", [from, to]) => BrowseCommand::Rename {
            from: from.clone(),
            to: to.clone(),
        },
        ("rename", _) => return Err(usage("rename <name> <new name>")),
        ("upload", []) => return Err(usage("upload <path>...")),
        ("upload", paths) => BrowseCommand::Upload(paths.iter().map(PathBuf::from).collect()),
        ("help" | "?", _) => BrowseCommand::Help,
        ("exit" | "quit", _) => BrowseCommand::Exit,
        (other, _) => {
            return Err(Error::InvalidArguments(format!(
                "Unknown command '{}'. Type help for a list of commands.",
                other
            )))
        }
    };
    Ok(command)
}

/// Splits a line on whitespace; double quotes group words.
fn split_arguments(line: &str) -> Result<Vec<String>, Error> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in line.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if in_quotes {
        return Err(Error::InvalidArguments("Unclosed quote".to_string()));
    }
    if has_token {
        args.push(current);
    }
    Ok(args)
}

/// Runs one command against the view.
pub async fn apply(
    view: &mut ViewState,
    cmd: BrowseCommand,
    ask_user_for_value: &dyn Fn(&str) -> Result<String, Error>,
) -> Result<Flow, Error> {
    debug!(command = ?cmd, "Browse command");

    let output = match cmd {
        BrowseCommand::Empty => String::new(),
        BrowseCommand::Help => HELP_TEXT.to_string(),
        BrowseCommand::Exit => return Ok(Flow::Exit),
        BrowseCommand::Repos => {
            view.refresh_repositories().await?;
            format_repositories(view.repositories())
        }
        BrowseCommand::Open(name) => {
            let repository = find_repository(view, &name)?;
            view.select_repository(repository).await;
            show_location(view)
        }
        BrowseCommand::Close => {
            view.deselect_repository();
            format_repositories(view.repositories())
        }
        BrowseCommand::Create { name, private } => {
            let created = repos_cmd::create(view, &name, "", private, true).await?;
            format!("{}\n{}", created, show_location(view))
        }
        BrowseCommand::List => {
            if view.selected_repository().is_none() {
                format_repositories(view.repositories())
            } else {
                format_listing(view.listing())
            }
        }
        BrowseCommand::ChangeDirectory(target) => {
            change_directory(view, &target).await?;
            show_location(view)
        }
        BrowseCommand::Crumb(index) => {
            require_repository(view)?;
            if index >= view.path_segments().len() {
                return Err(Error::InvalidArguments(format!(
                    "No breadcrumb {}; pwd shows the numbers",
                    index
                )));
            }
            view.ascend_to(index).await;
            show_location(view)
        }
        BrowseCommand::Pwd => {
            let repo = require_repository(view)?;
            format_breadcrumbs(&repo, view.path_segments())
        }
        BrowseCommand::Rename { from, to } => {
            require_repository(view)?;
            let id = view
                .listing()
                .iter()
                .find(|e| e.name == from)
                .map(|e| e.id.clone())
                .ok_or_else(|| Error::InvalidArguments(format!("No entry named '{}'", from)))?;
            if !view.rename_entry(&id, &to) {
                return Err(Error::InvalidArguments(
                    "The new name cannot be blank".to_string(),
                ));
            }
            format!("Renamed '{}' to '{}' in this view", from, to.trim())
        }
        BrowseCommand::Upload(paths) => {
            require_repository(view)?;
            let payload = DropPayload::from_local_paths(&paths).await?;
            let confirm = |count: usize| {
                ask_user_for_value(&confirmation_prompt(count))
                    .map(|answer| is_yes(&answer))
                    .unwrap_or(false)
            };
            match view.upload(payload, None, confirm).await? {
                Some(summary) => format!(
                    "{}\n{}",
                    format_upload_summary(&summary),
                    format_listing(view.listing())
                ),
                None => "Nothing uploaded".to_string(),
            }
        }
    };
    Ok(Flow::Continue(output))
}

async fn change_directory(view: &mut ViewState, target: &str) -> Result<(), Error> {
    require_repository(view)?;

    match target {
        "/" => view.reset_to_root().await,
        ".." => match view.path_segments().len() {
            0 => {}
            1 => view.reset_to_root().await,
            depth => view.ascend_to(depth - 2).await,
        },
        absolute if absolute.starts_with('/') => view.navigate_to(absolute).await,
        relative if relative.contains('/') => {
            let path = format!("{}/{}", view.current_path(), relative);
            view.navigate_to(&path).await;
        }
        name => {
            let is_folder = view
                .listing()
                .iter()
                .any(|e| e.is_folder() && e.name == name);
            if !is_folder {
                return Err(Error::InvalidArguments(format!(
                    "No folder named '{}' here",
                    name
                )));
            }
            view.descend(name).await;
        }
    }
    Ok(())
}

fn require_repository(view: &ViewState) -> Result<String, Error> {
    view.selected_repository()
        .map(|r| r.name.clone())
        .ok_or_else(|| {
            Error::InvalidArguments("Open a repository first (open <repo>)".to_string())
        })
}

fn show_location(view: &ViewState) -> String {
    match view.selected_repository() {
        Some(repo) => format!(
            "{}\n{}",
            format_breadcrumbs(&repo.name, view.path_segments()),
            format_listing(view.listing())
        ),
        None => format_repositories(view.repositories()),
    }
}
