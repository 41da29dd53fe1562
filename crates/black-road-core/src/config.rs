//! The configuration document
//!
//! A JSON document holding connection parameters for the two S3 backends
//! and the local Vault instance. In memory every field is plaintext; the
//! persistence layer in `black-road-secrets` encrypts the secret fields
//! before they reach disk. All leaves are optional: a document freshly
//! created by `init` starts out entirely null.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Root configuration document, persisted as `black-road.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Project name, used to key the remote state object
    pub name: Option<String>,
    pub gpg: GpgSection,
    pub vault: VaultSection,
    pub terraform: TerraformSection,
}

/// GPG identity used for at-rest encryption
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpgSection {
    pub key: Option<String>,
}

/// Vault connection parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VaultSection {
    pub s3: S3Backend,
    /// Secret: unseal key for the Vault instance
    pub unseal_key: Option<String>,
    /// Secret: token used to log in after unsealing
    pub access_token: Option<String>,
}

/// Terraform remote-state parameters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TerraformSection {
    pub s3: S3Backend,
}

/// Connection parameters for one S3-compatible backend
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct S3Backend {
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key: Option<String>,
    /// Secret: never written to disk in plaintext
    pub secret_key: Option<String>,
}

impl Config {
    /// The project name, required once `init` has run
    pub fn project_name(&self) -> Result<&str> {
        require(&self.name, "name")
    }
}

/// Unwrap an optional configuration field, naming it on failure
pub fn require<'a>(value: &'a Option<String>, field: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| Error::missing_field(field))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_parses_to_all_null() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(config.name.is_none());
        assert!(config.vault.s3.secret_key.is_none());
    }

    #[test]
    fn test_camel_case_on_disk() {
        let mut config = Config::default();
        config.vault.s3.access_key = Some("AKIA123".into());
        config.vault.unseal_key = Some("unseal".into());
        config.vault.access_token = Some("token".into());

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"accessKey\": \"AKIA123\""));
        assert!(json.contains("\"unsealKey\": \"unseal\""));
        assert!(json.contains("\"accessToken\": \"token\""));
        assert!(!json.contains("access_key"));
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.name = Some("prod".into());
        config.gpg.key = Some("ops@example.com".into());
        config.terraform.s3.bucket = Some("tf-state".into());
        config.terraform.s3.secret_key = Some("hunter2".into());

        let json = serde_json::to_string(&config).unwrap();
        let parsed: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_require() {
        assert_eq!(require(&Some("x".into()), "name").unwrap(), "x");

        let err = require(&None, "vault.s3.bucket").unwrap_err();
        assert!(err.to_string().contains("vault.s3.bucket"));

        // An empty string counts as unset
        assert!(require(&Some(String::new()), "name").is_err());
    }
}
