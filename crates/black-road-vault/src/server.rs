//! Vault server lifecycle
//!
//! Launches the server process against its S3 backend, polls status until
//! the initialized marker appears, unseals, and logs in. The storage
//! credentials are injected into the child's environment for that single
//! invocation; the parent environment is never touched. Failure at any
//! step aborts the whole command - a half-started server is the operator's
//! to clean up.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::process::{Child, Command};
use tracing::{debug, info};

use black_road_core::config::require;
use black_road_core::retry::{retry_with_policy, RetryPolicy};
use black_road_core::{paths, process, Config, Error, WorkPaths};

/// Marker the status report must contain before unseal is attempted
const INITIALIZED_MARKER: &str = "Initialized true";

/// Default status poll: 5 attempts, 3 seconds apart
pub fn status_retry_policy() -> RetryPolicy {
    RetryPolicy::fixed(5, Duration::from_secs(3))
}

/// Controller for the local Vault instance
pub struct VaultServer {
    program: String,
    work: WorkPaths,
    status_policy: RetryPolicy,
}

impl VaultServer {
    /// Controller using `vault` from PATH and the default status policy
    pub fn new(work: WorkPaths) -> Self {
        Self {
            program: "vault".to_string(),
            work,
            status_policy: status_retry_policy(),
        }
    }

    /// Override the vault binary (tests, non-standard installs)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Override the status poll policy
    pub fn with_status_policy(mut self, policy: RetryPolicy) -> Self {
        self.status_policy = policy;
        self
    }

    /// Launch the server, wait for it to report initialized, unseal it and
    /// log in. Returns the handle owning the running process.
    pub async fn start(&self, config: &Config) -> Result<VaultHandle> {
        let access_key = require(&config.vault.s3.access_key, "vault.s3.accessKey")?;
        let secret_key = require(&config.vault.s3.secret_key, "vault.s3.secretKey")?;
        let unseal_key = require(&config.vault.unseal_key, "vault.unsealKey")?;
        let access_token = require(&config.vault.access_token, "vault.accessToken")?;

        let config_path = self.work.vault_config();
        debug!("launching vault server with config {}", config_path.display());
        let child = Command::new(&self.program)
            .arg("server")
            .arg("-config")
            .arg(&config_path)
            .env("AWS_ACCESS_KEY_ID", access_key)
            .env("AWS_SECRET_ACCESS_KEY", secret_key)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {} server", self.program))?;

        self.wait_until_initialized().await?;
        self.unseal(unseal_key).await?;
        self.login(access_token).await?;
        info!("Vault is up, unsealed and logged in");

        Ok(VaultHandle { child })
    }

    async fn wait_until_initialized(&self) -> Result<()> {
        retry_with_policy(&self.status_policy, || self.status_initialized())
            .await
            .map_err(|err| Error::VaultNotInitialized {
                attempts: err.attempts,
            })?;
        Ok(())
    }

    /// One status probe. `vault status` exits nonzero while sealed, so
    /// only the report text is inspected.
    async fn status_initialized(&self) -> Result<()> {
        let output = process::run(&self.program, &["status", &addr_arg()], &[]).await?;
        let report = String::from_utf8_lossy(&output.stdout);
        let squeezed = report.split_whitespace().collect::<Vec<_>>().join(" ");
        if squeezed.contains(INITIALIZED_MARKER) {
            Ok(())
        } else {
            bail!("Vault is not started or not initialized");
        }
    }

    async fn unseal(&self, unseal_key: &str) -> Result<()> {
        process::run_checked(
            &self.program,
            &["operator", "unseal", &addr_arg(), unseal_key],
            &[],
        )
        .await
        .context("vault unseal failed")?;
        Ok(())
    }

    async fn login(&self, access_token: &str) -> Result<()> {
        process::run_checked(&self.program, &["login", &addr_arg(), access_token], &[])
            .await
            .context("vault login failed")?;
        Ok(())
    }
}

fn addr_arg() -> String {
    format!("-address={}", paths::VAULT_URL)
}

/// A running Vault server process
#[derive(Debug)]
pub struct VaultHandle {
    child: Child,
}

impl VaultHandle {
    /// OS process id, if the child is still running
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Terminate the server. Success of the kill call is the only
    /// confirmation of shutdown.
    pub async fn stop(mut self) -> Result<()> {
        debug!("stopping vault server");
        self.child.kill().await.context("failed to stop vault")?;
        Ok(())
    }
}
