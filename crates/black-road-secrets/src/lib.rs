//! Secrets handling for Black Road
//!
//! Two pieces: the [`GpgCodec`] binding to the external gpg binary, and the
//! [`ConfigStore`] that persists the configuration document with its secret
//! fields encrypted at rest.

pub mod codec;
pub mod store;

pub use codec::{kill_agent, GpgCodec};
pub use store::ConfigStore;
