//! Encrypted configuration persistence
//!
//! The document is plaintext in memory and ciphertext on disk: exactly
//! four fields are secret (the two S3 secret keys, the unseal key, and the
//! access token), and they pass through the [`GpgCodec`] on every save and
//! load. Nothing else in the repository reads or writes the document.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use black_road_core::{Config, Error};

use crate::codec::GpgCodec;

/// Loads and saves the configuration document
#[derive(Debug, Clone)]
pub struct ConfigStore {
    gpg_program: String,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Store using `gpg` from PATH
    pub fn new() -> Self {
        Self {
            gpg_program: "gpg".to_string(),
        }
    }

    /// Override the gpg binary (tests, non-standard installs)
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            gpg_program: program.into(),
        }
    }

    fn codec(&self, key: &str) -> GpgCodec {
        GpgCodec::new(key).with_program(&self.gpg_program)
    }

    /// Load the document, decrypting the secret fields.
    ///
    /// A missing file yields an all-null document. The decryption identity
    /// is the one recorded in the document, falling back to `fallback_key`
    /// for documents that predate the stamp. Parse and decrypt failures
    /// propagate; there is no partial-recovery path.
    pub async fn load(&self, path: &Path, fallback_key: Option<&str>) -> Result<Config> {
        if !path.exists() {
            debug!("no configuration at {}, starting blank", path.display());
            return Ok(Config::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let mut config: Config = serde_json::from_str(&raw)
            .map_err(Error::from)
            .with_context(|| format!("failed to parse {}", path.display()))?;

        let key = config
            .gpg
            .key
            .clone()
            .or_else(|| fallback_key.map(str::to_string))
            .ok_or_else(|| Error::missing_field("gpg.key"))?;
        let codec = self.codec(&key);

        config.vault.s3.secret_key = decrypt_field(&codec, config.vault.s3.secret_key).await?;
        config.vault.unseal_key = decrypt_field(&codec, config.vault.unseal_key).await?;
        config.vault.access_token = decrypt_field(&codec, config.vault.access_token).await?;
        config.terraform.s3.secret_key =
            decrypt_field(&codec, config.terraform.s3.secret_key).await?;

        Ok(config)
    }

    /// Persist the document with its secret fields encrypted.
    ///
    /// The caller's document is left untouched; a copy is stamped with the
    /// encryption identity and written as pretty-printed JSON, overwriting
    /// any existing file.
    pub async fn save(&self, path: &Path, key: &str, config: &Config) -> Result<()> {
        let mut doc = config.clone();
        doc.gpg.key = Some(key.to_string());

        let codec = self.codec(key);
        doc.vault.s3.secret_key = encrypt_field(&codec, doc.vault.s3.secret_key).await?;
        doc.vault.unseal_key = encrypt_field(&codec, doc.vault.unseal_key).await?;
        doc.vault.access_token = encrypt_field(&codec, doc.vault.access_token).await?;
        doc.terraform.s3.secret_key = encrypt_field(&codec, doc.terraform.s3.secret_key).await?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&doc).map_err(Error::from)?;
        std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        debug!("configuration saved to {}", path.display());
        Ok(())
    }
}

/// Encrypt a secret field in place; absent or empty values stay absent
async fn encrypt_field(codec: &GpgCodec, value: Option<String>) -> Result<Option<String>> {
    match value.filter(|v| !v.is_empty()) {
        Some(plain) => Ok(Some(codec.encrypt(&plain).await?)),
        None => Ok(None),
    }
}

/// Decrypt a secret field in place; absent or empty values stay absent
async fn decrypt_field(codec: &GpgCodec, value: Option<String>) -> Result<Option<String>> {
    match value.filter(|v| !v.is_empty()) {
        Some(ciphertext) => Ok(Some(codec.decrypt(&ciphertext).await?)),
        None => Ok(None),
    }
}
