//! Text rendering for repositories, listings, and upload results.

use colored::Colorize;
use github_client::{DirectoryEntry, Repository};
use net_disk_core::UploadSummary;

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

/// Renders the repository list, one repository per line.
pub fn format_repositories(repositories: &[Repository]) -> String {
    if repositories.is_empty() {
        return format!("{}\n", "(no repositories)".dimmed());
    }

    let width = repositories.iter().map(|r| r.name.len()).max().unwrap_or(0);
    let mut output = String::new();
    for repo in repositories {
        let visibility = if repo.private {
            repo.visibility().yellow().to_string()
        } else {
            repo.visibility().green().to_string()
        };
        output.push_str(&format!(
            "{:<width$}  {:<7}  {:<10}  {}",
            repo.name.bold(),
            visibility,
            repo.language,
            repo.updated_date().dimmed(),
            width = width
        ));
        if !repo.description.is_empty() {
            output.push_str(&format!("  {}", repo.description));
        }
        output.push('\n');
    }
    output
}

/// Renders one folder: folders first with a trailing `/`, then files with
/// their size.
pub fn format_listing(entries: &[DirectoryEntry]) -> String {
    if entries.is_empty() {
        return format!("{}\n", "(empty)".dimmed());
    }

    let width = entries.iter().map(|e| e.name.len() + 1).max().unwrap_or(0);
    let mut output = String::new();
    for entry in entries {
        let name = if entry.is_folder() {
            format!("{}/", entry.name).bright_blue().bold().to_string()
        } else {
            entry.name.clone()
        };
        output.push_str(&format!(
            "{:<width$}  {:>8}  {}\n",
            name,
            entry.size,
            entry.modified.dimmed(),
            width = width
        ));
    }
    output
}

/// Renders the location as `repo > [0] a > [1] b`; the numbers are what
/// `crumb` takes.
pub fn format_breadcrumbs(repository: &str, segments: &[String]) -> String {
    let mut output = repository.bold().bright_cyan().to_string();
    for (index, segment) in segments.iter().enumerate() {
        output.push_str(&format!(" > {} {}", format!("[{}]", index).dimmed(), segment));
    }
    output
}

/// Renders the outcome of an upload session, rate-limit notice first.
pub fn format_upload_summary(summary: &UploadSummary) -> String {
    let mut output = String::new();
    if let Some(notice) = summary.rate_limit_notice() {
        output.push_str(&format!("{}\n\n", notice.red().bold()));
    }

    let report = summary.report();
    let mut lines = report.lines();
    if let Some(headline) = lines.next() {
        let headline = if summary.is_success() {
            headline.green().bold()
        } else {
            headline.yellow().bold()
        };
        output.push_str(&format!("{}\n", headline));
    }
    for line in lines {
        output.push_str(line);
        output.push('\n');
    }
    output
}
