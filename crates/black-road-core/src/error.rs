//! Error types for black-road-core

use thiserror::Error;

/// Result type alias using black-road-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for Black Road
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file not found
    #[error("Configuration file not found: {path}. Run `black-road init` first")]
    ConfigNotFound { path: String },

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// One or more required external tools are missing from PATH
    #[error("Missing required tools: {tools}. Install them using the system package manager")]
    MissingTools { tools: String },

    /// GPG identity not present in the local keychain
    #[error("GPG key '{key}' does not exist in the local keychain")]
    KeyNotFound { key: String },

    /// A configuration field required by the current command is unset
    #[error("Missing required configuration field: {field}")]
    MissingField { field: String },

    /// An external command exited with a nonzero status
    #[error("{program} failed ({status}): {stderr}")]
    CommandFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// The Vault status poll never reported the initialized marker
    #[error("Vault is not started or not initialized (gave up after {attempts} attempts)")]
    VaultNotInitialized { attempts: u32 },
}

impl Error {
    /// Create a config not found error
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    /// Create a missing tools error from the list of missing tool names
    pub fn missing_tools(tools: &[&str]) -> Self {
        Self::MissingTools {
            tools: tools.join(", "),
        }
    }

    /// Create a key not found error
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a command failed error from a captured exit status and stderr
    pub fn command_failed(
        program: impl Into<String>,
        status: &std::process::ExitStatus,
        stderr: &[u8],
    ) -> Self {
        Self::CommandFailed {
            program: program.into(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}
