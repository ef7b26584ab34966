//! The persisted form of a cache.
//!
//! One manifest file exists per build target, stored as
//! `<cache_dir>/<hash of target output path>.json`. It records the global
//! invalidation keys, the build age, every entry and the source → destination
//! index used by per-root policies.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tessera_common::{ContentHash, Timestamp};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::keys::GlobalKeys;

/// Current manifest format version. Increment on breaking changes.
pub const FORMAT_VERSION: u32 = 1;

/// Returns the cache file path for the target producing `target_output`.
pub fn cache_file_path(cache_dir: &Path, target_output: &Path) -> PathBuf {
    cache_dir.join(format!("{}.json", ContentHash::of_path(target_output)))
}

/// Serialized cache state for one build target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Manifest format version.
    pub format_version: u32,

    /// Kind of the invalidation policy that produced this cache.
    pub policy: String,

    /// Output path of the target this cache belongs to.
    pub target: PathBuf,

    /// Global invalidation keys of the build that saved this cache.
    pub keys: GlobalKeys,

    /// Start time of the build that saved this cache.
    pub built_at: Option<Timestamp>,

    /// Per-source entries.
    #[serde(default)]
    pub entries: BTreeMap<PathBuf, CacheEntry>,

    /// Source → destination index for sources compiled to their own artifact.
    #[serde(default)]
    pub outputs: BTreeMap<PathBuf, PathBuf>,
}

impl CacheManifest {
    /// Creates an empty manifest.
    pub fn new(policy: &str, target: &Path, keys: GlobalKeys) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            policy: policy.to_string(),
            target: target.to_path_buf(),
            keys,
            built_at: None,
            entries: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Loads a manifest from `file`.
    ///
    /// Returns `Ok(None)` if the file doesn't exist and
    /// [`CacheError::Decode`] if it exists but can't be parsed.
    pub fn load(file: &Path) -> Result<Option<Self>, CacheError> {
        match std::fs::metadata(file) {
            Ok(meta) if meta.is_dir() => {
                return Err(CacheError::DirectoryConflict {
                    path: file.to_path_buf(),
                })
            }
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CacheError::Io {
                    path: file.to_path_buf(),
                    source: e,
                })
            }
        }
        let content = std::fs::read_to_string(file).map_err(|e| match e.kind() {
            ErrorKind::InvalidData => CacheError::Decode {
                path: file.to_path_buf(),
                reason: e.to_string(),
            },
            _ => CacheError::Io {
                path: file.to_path_buf(),
                source: e,
            },
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::Decode {
                path: file.to_path_buf(),
                reason: e.to_string(),
            })
    }

    /// Saves the manifest to `file`, creating its directory if needed.
    ///
    /// The content is written to a sibling temporary file and renamed into
    /// place, so readers never observe a half-written cache.
    pub fn save(&self, file: &Path) -> Result<(), CacheError> {
        if file.is_dir() {
            return Err(CacheError::DirectoryConflict {
                path: file.to_path_buf(),
            });
        }
        if let Some(dir) = file.parent() {
            std::fs::create_dir_all(dir).map_err(|e| CacheError::Io {
                path: dir.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        let tmp = file.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| CacheError::Io {
            path: tmp.clone(),
            source: e,
        })?;
        std::fs::rename(&tmp, file).map_err(|e| CacheError::Io {
            path: file.to_path_buf(),
            source: e,
        })
    }
}
