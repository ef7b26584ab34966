//! Parsing and validation of `tessera.toml` project configuration files.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`ProjectConfig`], and resolves individual build targets into absolute paths
//! with the global build parameters merged in.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE};
pub use resolve::{resolve_target, ResolvedRoot, ResolvedTarget};
pub use types::*;
