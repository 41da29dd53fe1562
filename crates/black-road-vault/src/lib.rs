//! Local Vault instance lifecycle for Black Road
//!
//! Renders the server config from the configuration document and drives
//! the start / poll / unseal / login / stop sequence against the external
//! `vault` binary.

mod server;
mod template;

pub use server::{status_retry_policy, VaultHandle, VaultServer};
pub use template::{write_config, VaultConfigTemplate};
