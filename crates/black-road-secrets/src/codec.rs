//! GPG secret codec
//!
//! Encrypts and decrypts opaque strings through the external gpg binary,
//! keyed by a named identity. Both directions stream through the child's
//! stdin/stdout pipes; no plaintext or ciphertext ever touches disk here.
//! Because the pipe handles are owned by each call, they are released on
//! every exit path, success or failure.
//!
//! Ciphertext is gpg's binary output encoded as base64 so it can live
//! inside a JSON document.

use std::path::Path;

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use tracing::debug;

use black_road_core::process;
use black_road_core::Error;

/// Codec bound to one gpg identity
#[derive(Debug, Clone)]
pub struct GpgCodec {
    program: String,
    key: String,
}

impl GpgCodec {
    /// Create a codec for the named identity, using `gpg` from PATH
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            program: "gpg".to_string(),
            key: key.into(),
        }
    }

    /// Override the gpg binary (tests, non-standard installs)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// The identity this codec encrypts to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Encrypt a plaintext string to printable ciphertext
    ///
    /// Fails if the identity is unknown to gpg.
    pub async fn encrypt(&self, plaintext: &str) -> Result<String> {
        let output = process::run_with_input(
            &self.program,
            &[
                "--batch",
                "--always-trust",
                "--yes",
                "--encrypt",
                "-r",
                &self.key,
            ],
            &[],
            plaintext.as_bytes(),
        )
        .await
        .with_context(|| format!("gpg encryption for '{}' failed", self.key))?;

        Ok(BASE64.encode(&output.stdout))
    }

    /// Decrypt printable ciphertext back to the plaintext string
    pub async fn decrypt(&self, ciphertext: &str) -> Result<String> {
        // Tolerate line wrapping introduced by editors or transport.
        let compact: String = ciphertext.split_whitespace().collect();
        let raw = BASE64
            .decode(compact.as_bytes())
            .context("ciphertext is not valid base64")?;

        let output = process::run_with_input(
            &self.program,
            &["--batch", "--quiet", "--decrypt"],
            &[],
            &raw,
        )
        .await
        .with_context(|| format!("gpg decryption for '{}' failed", self.key))?;

        String::from_utf8(output.stdout).context("decrypted payload is not valid UTF-8")
    }

    /// Check the identity exists in the local keychain
    pub async fn verify_key(&self) -> Result<()> {
        let output = process::run_checked(&self.program, &["--list-secret-keys"], &[]).await?;
        let listing = String::from_utf8_lossy(&output.stdout);

        if contains_word(&listing, &self.key) {
            Ok(())
        } else {
            Err(Error::key_not_found(&self.key).into())
        }
    }

    /// Encrypt a file on disk to another file (used for the state blob)
    pub async fn encrypt_file(&self, src: &Path, dest: &Path) -> Result<()> {
        let src_s = src.display().to_string();
        let dest_s = dest.display().to_string();
        process::run_checked(
            &self.program,
            &[
                "--batch",
                "--always-trust",
                "--yes",
                "--encrypt",
                "-o",
                &dest_s,
                "-r",
                &self.key,
                &src_s,
            ],
            &[],
        )
        .await
        .with_context(|| format!("gpg encryption of {src_s} failed"))?;
        Ok(())
    }

    /// Decrypt a file on disk to another file
    pub async fn decrypt_file(&self, src: &Path, dest: &Path) -> Result<()> {
        let src_s = src.display().to_string();
        let dest_s = dest.display().to_string();
        process::run_checked(
            &self.program,
            &["--batch", "--quiet", "--decrypt", "-o", &dest_s, &src_s],
            &[],
        )
        .await
        .with_context(|| format!("gpg decryption of {src_s} failed"))?;
        Ok(())
    }
}

/// Best-effort gpg-agent restart so cached passphrase state never spans
/// runs. Failure is ignored; the agent may simply not be running.
pub async fn kill_agent() {
    kill_agent_with("gpgconf").await;
}

/// As [`kill_agent`], with an explicit gpgconf binary
pub async fn kill_agent_with(program: &str) {
    debug!("restarting gpg-agent");
    let _ = process::run(program, &["--kill", "gpg-agent"], &[]).await;
}

/// Word-bounded substring match, as `grep -w` defines words
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let is_boundary =
        |c: Option<char>| c.map_or(true, |c| !c.is_alphanumeric() && c != '_');
    haystack.match_indices(needle).any(|(i, _)| {
        is_boundary(haystack[..i].chars().next_back())
            && is_boundary(haystack[i + needle.len()..].chars().next())
    })
}
