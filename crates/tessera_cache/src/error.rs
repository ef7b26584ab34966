//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur during cache operations.
///
/// Loading is fail-safe for content problems: a cache file that cannot be
/// decoded is reported as [`CacheError::Decode`] by the manifest layer and
/// turned into an empty cache by [`Cache::load`](crate::Cache::load).
/// Environment problems (I/O failures, a directory where the cache file
/// belongs) are fatal.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The cache file path exists but is a directory.
    #[error("cache path {path} is a directory; remove it or choose another cache directory")]
    DirectoryConflict {
        /// The conflicting path.
        path: PathBuf,
    },

    /// The cache file could not be decoded.
    #[error("failed to decode cache file {path}: {reason}")]
    Decode {
        /// The cache file path.
        path: PathBuf,
        /// Description of the decode failure.
        reason: String,
    },

    /// A serialization error occurred while encoding the cache.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
