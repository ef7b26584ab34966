//! Global invalidation keys.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Build-wide parameters persisted alongside a cache.
///
/// When a cache is loaded, the persisted keys are compared with the keys of
/// the current build by the cache's
/// [`InvalidationPolicy`](crate::InvalidationPolicy). A mismatch in any key
/// the policy cares about discards every entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalKeys {
    /// Compact-output flag.
    #[serde(default)]
    pub compact: bool,
    /// Build/version marker.
    #[serde(default)]
    pub version: String,
    /// Externally supplied commit tag.
    #[serde(default)]
    pub commit: Option<String>,
    /// Global constant definitions (name → value).
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
    /// Named entry points. A set, so declaration order never matters.
    #[serde(default)]
    pub entry_points: BTreeSet<String>,
    /// Pixel density setting.
    #[serde(default)]
    pub pixel_density: Option<f64>,
    /// External stylesheet URLs.
    #[serde(default)]
    pub css_urls: Vec<String>,
    /// External script URLs.
    #[serde(default)]
    pub js_urls: Vec<String>,
}

impl GlobalKeys {
    /// Creates keys carrying only a build/version marker.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            ..Self::default()
        }
    }
}
