//! Working-directory layout
//!
//! Black Road keeps everything relative to the directory it is invoked
//! from: the configuration document at the root, and generated artifacts
//! (the rendered Vault config and the encrypted state staging copy) under
//! a hidden system directory.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Hidden system directory for generated artifacts
pub const SYS_DIR: &str = ".black-road";

/// Configuration document file name
pub const CONFIG_FILE: &str = "black-road.json";

/// Rendered Vault server config file name (inside the system directory)
pub const VAULT_CONFIG_FILE: &str = "vault.hcl";

/// Plaintext Terraform state file name (working-directory root)
pub const STATE_FILE: &str = "terraform.tfstate";

/// Address the local Vault listener binds to
pub const VAULT_HOST: &str = "127.0.0.1:8200";

/// API URL of the local Vault instance
pub const VAULT_URL: &str = "http://127.0.0.1:8200";

/// Cluster address written into the Vault config
pub const VAULT_CLUSTER_ADDR: &str = "https://127.0.0.1:8201";

/// Remote object key for a project's encrypted state.
///
/// The `.tfsate` spelling is historical: existing buckets already hold
/// objects under this key, so it must not be corrected.
pub fn state_object_key(project: &str) -> String {
    format!("{project}.tfsate")
}

/// Resolved paths for one working directory
#[derive(Debug, Clone)]
pub struct WorkPaths {
    root: PathBuf,
}

impl WorkPaths {
    /// Create paths rooted at the given directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create paths rooted at the current working directory
    pub fn from_current_dir() -> Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    /// The working-directory root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The hidden system directory
    pub fn sys_dir(&self) -> PathBuf {
        self.root.join(SYS_DIR)
    }

    /// The configuration document
    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// The rendered Vault server config
    pub fn vault_config(&self) -> PathBuf {
        self.sys_dir().join(VAULT_CONFIG_FILE)
    }

    /// The plaintext Terraform state file
    pub fn state_file(&self) -> PathBuf {
        self.root.join(STATE_FILE)
    }

    /// The local encrypted state staging copy for a project
    pub fn encrypted_state(&self, project: &str) -> PathBuf {
        self.sys_dir().join(state_object_key(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_object_key_keeps_historical_spelling() {
        assert_eq!(state_object_key("prod"), "prod.tfsate");
    }

    #[test]
    fn test_paths_are_rooted() {
        let paths = WorkPaths::new("/work");
        assert_eq!(paths.config_file(), PathBuf::from("/work/black-road.json"));
        assert_eq!(
            paths.vault_config(),
            PathBuf::from("/work/.black-road/vault.hcl")
        );
        assert_eq!(
            paths.state_file(),
            PathBuf::from("/work/terraform.tfstate")
        );
        assert_eq!(
            paths.encrypted_state("prod"),
            PathBuf::from("/work/.black-road/prod.tfsate")
        );
    }
}
