//! Init command - interactive setup of the encrypted configuration
//!
//! Verifies the chosen gpg identity can round-trip a canary string, fills
//! every configuration field interactively (existing values offered as
//! defaults), persists the document encrypted, renders the Vault server
//! config, and starts Vault once to validate connectivity.

use anyhow::Result;
use camino::Utf8Path;
use dialoguer::Input;

use black_road_core::WorkPaths;
use black_road_secrets::{codec, ConfigStore, GpgCodec};
use black_road_vault::VaultServer;

use super::common::{preconditions, resolve_config_path};
use crate::output;

pub async fn run(config_override: Option<&Utf8Path>) -> Result<()> {
    let statuses = preconditions().await?;
    for status in &statuses {
        output::kv(status.tool.id, status.version.as_deref().unwrap_or("unknown version"));
    }

    let work = WorkPaths::from_current_dir()?;

    let key: String = Input::new()
        .with_prompt("Name of GPG key to use when working with the root secrets")
        .interact_text()?;
    let key = key.trim().to_string();

    let gpg = GpgCodec::new(&key);
    if let Err(err) = gpg.verify_key().await {
        output::error(&err.to_string());
        return Ok(());
    }

    codec::kill_agent().await;
    let canary = gpg.decrypt(&gpg.encrypt("GPG key verified").await?).await?;
    output::info(&canary);

    let store = ConfigStore::new();
    let config_path = resolve_config_path(config_override, &work);
    let mut config = store.load(&config_path, Some(&key)).await?;

    config.name = prompt_field(
        "Project name (will be used for saving Terraform state)",
        config.name.take(),
    )?;

    let vault_s3 = &mut config.vault.s3;
    vault_s3.endpoint = prompt_field("S3 endpoint for the Vault back end", vault_s3.endpoint.take())?;
    vault_s3.region = prompt_field("S3 region for the Vault back end", vault_s3.region.take())?;
    vault_s3.bucket = prompt_field("S3 bucket for the Vault back end", vault_s3.bucket.take())?;
    vault_s3.access_key =
        prompt_field("S3 access key for the Vault back end", vault_s3.access_key.take())?;
    vault_s3.secret_key =
        prompt_field("S3 secret key for the Vault back end", vault_s3.secret_key.take())?;
    config.vault.unseal_key =
        prompt_field("Vault unseal key", config.vault.unseal_key.take())?;
    config.vault.access_token =
        prompt_field("Vault access token", config.vault.access_token.take())?;

    let tf_s3 = &mut config.terraform.s3;
    tf_s3.endpoint =
        prompt_field("S3 endpoint for the Terraform back end", tf_s3.endpoint.take())?;
    tf_s3.region = prompt_field("S3 region for the Terraform back end", tf_s3.region.take())?;
    tf_s3.bucket = prompt_field("S3 bucket for the Terraform back end", tf_s3.bucket.take())?;
    tf_s3.access_key =
        prompt_field("S3 access key for the Terraform back end", tf_s3.access_key.take())?;
    tf_s3.secret_key =
        prompt_field("S3 secret key for the Terraform back end", tf_s3.secret_key.take())?;

    store.save(&config_path, &key, &config).await?;
    output::info(&format!("Config file was saved at {}", config_path.display()));

    black_road_vault::write_config(&work, &config)?;

    output::info(
        "Starting local Vault instance. S3 back end must be accessible and initialized \
         (vault operator init)",
    );
    let spinner = output::spinner("Starting Vault...");
    let vault = VaultServer::new(work.clone()).start(&config).await;
    spinner.finish_and_clear();
    let vault = vault?;
    output::info("Vault is up");

    vault.stop().await?;
    output::success("Vault was gracefully shut down. Black Road init sequence is complete.");
    Ok(())
}

/// Prompt for one field, offering the saved value as the default.
/// Empty input with no default leaves the field unset.
fn prompt_field(message: &str, current: Option<String>) -> Result<Option<String>> {
    let mut input = Input::<String>::new()
        .with_prompt(message)
        .allow_empty(true);
    if let Some(default) = current {
        input = input.default(default);
    }
    let value = input.interact_text()?;
    let trimmed = value.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}
