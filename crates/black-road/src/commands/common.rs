//! Shared orchestration for apply/plan

use std::path::PathBuf;

use anyhow::Result;
use camino::Utf8Path;

use black_road_core::{process, Error, WorkPaths};
use black_road_secrets::{codec, ConfigStore};
use black_road_state::StateSync;
use black_road_vault::VaultServer;

use crate::output;

/// Check the required external tools, reporting any that are missing.
/// Returns the statuses so callers can surface detected versions.
pub async fn preconditions() -> Result<Vec<black_road_doctor::ToolStatus>> {
    let statuses = black_road_doctor::check_required().await;
    let missing = black_road_doctor::missing(&statuses);
    if !missing.is_empty() {
        output::error(&black_road_doctor::format_missing(&missing));
        let names: Vec<&str> = missing.iter().map(|s| s.tool.id).collect();
        return Err(Error::missing_tools(&names).into());
    }
    Ok(statuses)
}

/// The configuration document path, honoring a `--config` override
pub fn resolve_config_path(config_override: Option<&Utf8Path>, work: &WorkPaths) -> PathBuf {
    config_override
        .map(|p| p.as_std_path().to_path_buf())
        .unwrap_or_else(|| work.config_file())
}

/// What the provisioning step should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Apply,
    Plan,
}

/// The apply/plan sequence. Both commands start the Vault instance and
/// pull remote state before Terraform runs; only a successful `apply`
/// pushes state back.
pub async fn provision(config_override: Option<&Utf8Path>, mode: Mode) -> Result<()> {
    preconditions().await?;

    let work = WorkPaths::from_current_dir()?;
    let config_path = resolve_config_path(config_override, &work);
    if !config_path.exists() {
        let err = Error::config_not_found(config_path.display().to_string());
        output::error(&err.to_string());
        return Ok(());
    }

    codec::kill_agent().await;
    let config = ConfigStore::new().load(&config_path, None).await?;

    let spinner = output::spinner("Starting Vault...");
    let vault = VaultServer::new(work.clone()).start(&config).await;
    spinner.finish_and_clear();
    let vault = vault?;
    output::success("Vault is up, unsealed and logged in");

    let sync = StateSync::new(work.clone());
    sync.pull(&config).await?;

    let terraform_args: &[&str] = match mode {
        Mode::Apply => &["apply", "-auto-approve"],
        Mode::Plan => &["plan"],
    };
    process::run_streaming("terraform", terraform_args, &[]).await?;

    vault.stop().await?;
    output::info("Vault was gracefully shut down");

    if mode == Mode::Apply {
        sync.push(&config).await?;
    }
    Ok(())
}
