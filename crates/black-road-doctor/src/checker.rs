//! Parallel tool checking
//!
//! Availability and version checks for the required tools, run
//! concurrently. A version lookup that hangs (network-touching CLIs have
//! been known to) is cut off by a per-check timeout rather than stalling
//! the command.

use std::time::Duration;

use futures::future::join_all;
use tokio::process::Command;
use tracing::debug;

use crate::tool::ToolDefinition;

/// Result of checking one tool
#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub tool: &'static ToolDefinition,
    pub available: bool,
    pub version: Option<String>,
}

/// Tool checker that runs availability and version checks
pub struct ToolChecker {
    timeout: Duration,
}

impl Default for ToolChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolChecker {
    /// Checker with the default 5-second per-check timeout
    pub fn new() -> Self {
        Self {
            timeout: Duration::from_secs(5),
        }
    }

    /// Checker with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Check all tools in parallel
    pub async fn check_all(&self, tools: &'static [ToolDefinition]) -> Vec<ToolStatus> {
        join_all(tools.iter().map(|tool| self.check_tool(tool))).await
    }

    async fn check_tool(&self, tool: &'static ToolDefinition) -> ToolStatus {
        if which::which(tool.command).is_err() {
            debug!("{} not found in PATH", tool.command);
            return ToolStatus {
                tool,
                available: false,
                version: None,
            };
        }

        ToolStatus {
            tool,
            available: true,
            version: self.get_version(tool).await,
        }
    }

    /// First line of the tool's version output, if it answers in time
    async fn get_version(&self, tool: &ToolDefinition) -> Option<String> {
        let result = tokio::time::timeout(self.timeout, async {
            Command::new(tool.command)
                .arg(tool.version_flag)
                .output()
                .await
        })
        .await;

        match result {
            Ok(Ok(output)) if output.status.success() => {
                let text = if output.stdout.is_empty() {
                    String::from_utf8_lossy(&output.stderr).to_string()
                } else {
                    String::from_utf8_lossy(&output.stdout).to_string()
                };
                text.lines().next().map(|line| line.trim().to_string())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn stub(dir: &std::path::Path, name: &str, script: &str) {
        let path = dir.join(name);
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
    }

    struct PathGuard(std::ffi::OsString);

    impl PathGuard {
        fn set(dir: &std::path::Path) -> Self {
            let original = std::env::var_os("PATH").unwrap_or_default();
            // Only the stub dir: stray system installs of the real tools
            // must not satisfy the lookup. Stubs carry absolute shebangs.
            std::env::set_var("PATH", dir.as_os_str());
            Self(original)
        }
    }

    impl Drop for PathGuard {
        fn drop(&mut self) {
            std::env::set_var("PATH", &self.0);
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_check_all_reports_missing_and_available() {
        let dir = TempDir::new().unwrap();
        stub(
            dir.path(),
            "vault",
            "#!/bin/sh\necho 'Vault v1.17.2 (build deadbeef)'\n",
        );
        let _guard = PathGuard::set(dir.path());

        let statuses = ToolChecker::new()
            .check_all(crate::registry::REQUIRED_TOOLS)
            .await;

        let vault = statuses.iter().find(|s| s.tool.id == "vault").unwrap();
        assert!(vault.available);
        assert_eq!(vault.version.as_deref(), Some("Vault v1.17.2 (build deadbeef)"));

        let terraform = statuses.iter().find(|s| s.tool.id == "terraform").unwrap();
        assert!(!terraform.available);
        assert!(terraform.version.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_version_timeout_does_not_stall() {
        let dir = TempDir::new().unwrap();
        stub(dir.path(), "vault", "#!/bin/sh\nsleep 10\n");
        let _guard = PathGuard::set(dir.path());

        let checker = ToolChecker::with_timeout(Duration::from_millis(100));
        let statuses = checker.check_all(crate::registry::REQUIRED_TOOLS).await;

        let vault = statuses.iter().find(|s| s.tool.id == "vault").unwrap();
        assert!(vault.available);
        assert!(vault.version.is_none());
    }
}
