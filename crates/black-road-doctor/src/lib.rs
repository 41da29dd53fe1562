//! External tool detection for Black Road
//!
//! Every command starts by checking that the four external collaborators
//! (gpg, vault, terraform, aws) are present on PATH. Absence of any is a
//! fatal precondition failure reported before any other action.

mod checker;
mod registry;
mod tool;

pub use checker::{ToolChecker, ToolStatus};
pub use registry::REQUIRED_TOOLS;
pub use tool::ToolDefinition;

use owo_colors::OwoColorize;

/// Check the required tools concurrently
pub async fn check_required() -> Vec<ToolStatus> {
    ToolChecker::new().check_all(REQUIRED_TOOLS).await
}

/// The subset of statuses whose tool was not found
pub fn missing(statuses: &[ToolStatus]) -> Vec<&ToolStatus> {
    statuses.iter().filter(|s| !s.available).collect()
}

/// Human-readable report for missing tools, one line per tool
pub fn format_missing(missing: &[&ToolStatus]) -> String {
    missing
        .iter()
        .map(|status| {
            format!(
                "Black Road needs {} installed to work. {}\n  {} {}",
                status.tool.name.bold(),
                status.tool.install_hint,
                "docs:".dimmed(),
                status.tool.docs_url.dimmed(),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
