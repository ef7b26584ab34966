//! Configuration errors.

use std::path::PathBuf;

/// Errors raised while loading, validating or resolving a `tessera.toml`.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected schema.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// No target with the requested name is configured.
    #[error("unknown target `{name}` (configured: {configured})")]
    UnknownTarget {
        /// The requested target name.
        name: String,
        /// Comma-separated configured target names.
        configured: String,
    },

    /// A required field is missing or empty. Holds the field's dotted key.
    #[error("missing required field `{0}`")]
    MissingField(String),

    /// A value is present but not acceptable.
    #[error("invalid value: {0}")]
    Invalid(String),
}
