//! Tool registry
//!
//! The four external collaborators every Black Road command depends on.
//! All of them are required; absence of any is a fatal precondition
//! failure reported before anything else runs.

use crate::tool::ToolDefinition;

/// Static registry of required tools
pub static REQUIRED_TOOLS: &[ToolDefinition] = &[
    ToolDefinition {
        id: "gpg",
        name: "GnuPG",
        description: "Asymmetric encryption for configuration secrets and the remote state blob",
        command: "gpg",
        version_flag: "--version",
        install_hint: "Install it using the system package manager (e.g. apt install gnupg, brew install gnupg)",
        docs_url: "https://gnupg.org/documentation/",
    },
    ToolDefinition {
        id: "vault",
        name: "HashiCorp Vault",
        description: "Secrets server launched locally against its S3 backend during deployments",
        command: "vault",
        version_flag: "version",
        install_hint: "Install it using the system package manager (e.g. brew install hashicorp/tap/vault)",
        docs_url: "https://developer.hashicorp.com/vault/docs",
    },
    ToolDefinition {
        id: "terraform",
        name: "Terraform",
        description: "Infrastructure provisioning (plan and apply) against the local state file",
        command: "terraform",
        version_flag: "version",
        install_hint: "Install it using the system package manager (e.g. brew install hashicorp/tap/terraform)",
        docs_url: "https://developer.hashicorp.com/terraform/docs",
    },
    ToolDefinition {
        id: "aws",
        name: "AWS CLI",
        description: "Object storage transfer for the encrypted remote state",
        command: "aws",
        version_flag: "--version",
        install_hint: "Install it using the system package manager (e.g. apt install awscli, brew install awscli)",
        docs_url: "https://docs.aws.amazon.com/cli/",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_the_four_collaborators() {
        let ids: Vec<&str> = REQUIRED_TOOLS.iter().map(|t| t.id).collect();
        assert_eq!(ids, ["gpg", "vault", "terraform", "aws"]);
    }
}
