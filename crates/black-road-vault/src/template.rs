//! Vault server config rendering
//!
//! The server config is a static template filled from the configuration
//! document: an S3 storage backend block, a plaintext TCP listener on the
//! fixed local address, and the API/cluster addresses. It is regenerated
//! on every `init`.

use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};
use tracing::debug;

use black_road_core::config::require;
use black_road_core::{paths, Config, WorkPaths};

/// Template registry for the Vault server config
pub struct VaultConfigTemplate {
    tera: Tera,
}

impl VaultConfigTemplate {
    /// Create a registry with the embedded template
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("vault.hcl", include_str!("vault.hcl.tera"))?;
        Ok(Self { tera })
    }

    /// Render the server config from the document's Vault S3 backend
    pub fn render(&self, config: &Config) -> Result<String> {
        let s3 = &config.vault.s3;
        let mut ctx = TeraContext::new();
        ctx.insert("bucket", require(&s3.bucket, "vault.s3.bucket")?);
        ctx.insert("endpoint", require(&s3.endpoint, "vault.s3.endpoint")?);
        ctx.insert("region", require(&s3.region, "vault.s3.region")?);
        ctx.insert("listen_addr", paths::VAULT_HOST);
        ctx.insert("api_addr", paths::VAULT_URL);
        ctx.insert("cluster_addr", paths::VAULT_CLUSTER_ADDR);

        Ok(self.tera.render("vault.hcl", &ctx)?)
    }
}

/// Render and write the server config under the system directory
pub fn write_config(work: &WorkPaths, config: &Config) -> Result<()> {
    let rendered = VaultConfigTemplate::new()?.render(config)?;
    std::fs::create_dir_all(work.sys_dir())
        .with_context(|| format!("failed to create {}", work.sys_dir().display()))?;
    let path = work.vault_config();
    std::fs::write(&path, rendered)
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!("vault config written to {}", path.display());
    Ok(())
}
