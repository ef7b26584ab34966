//! Error types for the build driver.

use std::path::PathBuf;

use tessera_bundle::BundleError;
use tessera_cache::CacheError;
use tessera_config::ConfigError;

/// Errors that abort a build.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The project configuration couldn't be loaded or resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The target cache couldn't be loaded or saved.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Compiling a root failed. Earlier roots of the batch were kept.
    #[error("failed to build {}: {source}", root.display())]
    Bundle {
        /// The root being compiled.
        root: PathBuf,
        /// The pipeline error.
        source: BundleError,
    },

    /// An artifact couldn't be written.
    #[error("failed to write {}: {source}", path.display())]
    Output {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A per-root target lists a root without a destination.
    #[error("root {} has no output path", root.display())]
    MissingOutput {
        /// The root lacking a destination.
        root: PathBuf,
    },
}
