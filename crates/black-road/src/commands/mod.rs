//! Command implementations

pub mod apply;
mod common;
pub mod init;
pub mod plan;

use crate::output;

/// Printed when no subcommand is given; has no side effects
pub fn welcome() {
    output::info("Welcome to Black Road deploy utility");
    output::kv("init", "set up the encrypted configuration and validate Vault connectivity");
    output::kv("apply", "deploy: pull remote state, terraform apply, push updated state");
    output::kv("plan", "preview changes without touching remote state");
}
