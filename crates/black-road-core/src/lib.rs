//! Core library for the Black Road CLI
//!
//! Holds what every other crate needs: the configuration document types,
//! the fixed working-directory layout, typed errors, child-process
//! execution helpers, and the bounded retry primitive.

pub mod config;
pub mod error;
pub mod paths;
pub mod process;
pub mod retry;

pub use config::Config;
pub use error::{Error, Result};
pub use paths::WorkPaths;
