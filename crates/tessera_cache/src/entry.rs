//! Per-path cache entries.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tessera_common::Timestamp;

/// Cached build state for one source path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Paths this source depended on when it was last compiled.
    #[serde(default)]
    pub dependencies: BTreeSet<PathBuf>,

    /// Modification time of the source when its compilation started.
    #[serde(default)]
    pub mtime: Option<Timestamp>,

    /// Garbage-collection mark. Never persisted.
    #[serde(skip)]
    pub touched: bool,

    /// Associated unit (e.g. the controlling script of a view).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub association: Option<String>,
}

impl CacheEntry {
    /// Adds a dependency. Returns `false` if it was already recorded.
    pub fn add_dependency(&mut self, dep: PathBuf) -> bool {
        self.dependencies.insert(dep)
    }
}
