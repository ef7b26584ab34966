//! Invalidation policies: what distinguishes one cache variant from another.
//!
//! Every cache shares the same engine. A policy decides which global keys
//! invalidate the whole cache, whether a single entry is invalid for reasons
//! other than file times, and which age a root is measured against.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::entry::CacheEntry;
use crate::keys::GlobalKeys;

/// Variant-specific invalidation rules injected into a [`Cache`](crate::Cache).
pub trait InvalidationPolicy: Send + Sync {
    /// Stable name of the policy, persisted with the cache. A cache saved
    /// under a different kind is discarded on load.
    fn kind(&self) -> &'static str;

    /// Returns `true` if a cache persisted with `persisted` keys may be reused
    /// by a build running with `requested` keys.
    fn keys_match(&self, persisted: &GlobalKeys, requested: &GlobalKeys) -> bool;

    /// Returns `true` if `entry` is invalid regardless of file times.
    fn entry_is_invalid(&self, _path: &Path, _entry: &CacheEntry) -> bool {
        false
    }

    /// Returns `true` if each root is measured against the modification time
    /// of its own destination file instead of the global build age.
    fn measures_root_age(&self) -> bool {
        false
    }
}

impl<P: InvalidationPolicy + ?Sized> InvalidationPolicy for Box<P> {
    fn kind(&self) -> &'static str {
        (**self).kind()
    }

    fn keys_match(&self, persisted: &GlobalKeys, requested: &GlobalKeys) -> bool {
        (**self).keys_match(persisted, requested)
    }

    fn entry_is_invalid(&self, path: &Path, entry: &CacheEntry) -> bool {
        (**self).entry_is_invalid(path, entry)
    }

    fn measures_root_age(&self) -> bool {
        (**self).measures_root_age()
    }
}

/// A single global age plus the keys that reach every artifact: the
/// build/version marker, the compact flag and constant definitions.
#[derive(Debug, Clone, Default)]
pub struct PlainPolicy;

impl InvalidationPolicy for PlainPolicy {
    fn kind(&self) -> &'static str {
        "plain"
    }

    fn keys_match(&self, persisted: &GlobalKeys, requested: &GlobalKeys) -> bool {
        persisted.version == requested.version
            && persisted.compact == requested.compact
            && persisted.defines == requested.defines
    }
}

/// Bundles with several named entry points.
///
/// Also invalidates on the compact flag, constant definitions and the commit
/// tag, all of which change the generated code of every unit.
#[derive(Debug, Clone, Default)]
pub struct EntryPointPolicy;

impl InvalidationPolicy for EntryPointPolicy {
    fn kind(&self) -> &'static str {
        "entry-points"
    }

    fn keys_match(&self, persisted: &GlobalKeys, requested: &GlobalKeys) -> bool {
        persisted.version == requested.version
            && persisted.compact == requested.compact
            && persisted.commit == requested.commit
            && persisted.defines == requested.defines
            && persisted.entry_points == requested.entry_points
    }
}

/// Targets whose roots are each paired with an associated unit, such as
/// views and their controlling scripts.
///
/// The requested association of every root is known up front. An entry
/// recorded with a different association is invalid even if no file changed.
#[derive(Debug, Clone, Default)]
pub struct AssociatedPolicy {
    associations: BTreeMap<PathBuf, String>,
}

impl AssociatedPolicy {
    /// Creates a policy with no associations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `root` is paired with `association` in this build.
    pub fn with_association(mut self, root: impl Into<PathBuf>, association: impl Into<String>) -> Self {
        self.associations.insert(root.into(), association.into());
        self
    }

    /// Returns the association requested for `root`, if any.
    pub fn association(&self, root: &Path) -> Option<&str> {
        self.associations.get(root).map(String::as_str)
    }
}

impl InvalidationPolicy for AssociatedPolicy {
    fn kind(&self) -> &'static str {
        "associated"
    }

    fn keys_match(&self, persisted: &GlobalKeys, requested: &GlobalKeys) -> bool {
        persisted.version == requested.version
            && persisted.compact == requested.compact
            && persisted.pixel_density == requested.pixel_density
            && persisted.css_urls == requested.css_urls
            && persisted.js_urls == requested.js_urls
            && persisted.defines == requested.defines
    }

    fn entry_is_invalid(&self, path: &Path, entry: &CacheEntry) -> bool {
        self.association(path) != entry.association.as_deref()
    }

    fn measures_root_age(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> GlobalKeys {
        GlobalKeys::new("1.0")
    }

    #[test]
    fn plain_sensitive_to_emitted_keys() {
        let compact = GlobalKeys {
            compact: true,
            ..keys()
        };
        let mut defines = keys();
        defines.defines.insert("DEBUG".into(), "false".into());
        assert!(PlainPolicy.keys_match(&keys(), &keys()));
        assert!(!PlainPolicy.keys_match(&keys(), &compact));
        assert!(!PlainPolicy.keys_match(&keys(), &defines));
        assert!(!PlainPolicy.keys_match(&keys(), &GlobalKeys::new("2.0")));
    }

    #[test]
    fn plain_ignores_script_and_view_keys() {
        let other = GlobalKeys {
            commit: Some("abc".into()),
            entry_points: ["main".to_string()].into(),
            pixel_density: Some(2.0),
            ..keys()
        };
        assert!(PlainPolicy.keys_match(&keys(), &other));
    }

    #[test]
    fn entry_points_compare_as_sets() {
        let a = GlobalKeys {
            entry_points: ["main".to_string(), "admin".to_string()].into(),
            ..keys()
        };
        let b = GlobalKeys {
            entry_points: ["admin".to_string(), "main".to_string()].into(),
            ..keys()
        };
        let c = GlobalKeys {
            entry_points: ["main".to_string()].into(),
            ..keys()
        };
        assert!(EntryPointPolicy.keys_match(&a, &b));
        assert!(!EntryPointPolicy.keys_match(&a, &c));
    }

    #[test]
    fn entry_points_sensitive_to_defines_and_commit() {
        let mut defines = keys();
        defines.defines.insert("DEBUG".into(), "true".into());
        assert!(!EntryPointPolicy.keys_match(&keys(), &defines));

        let commit = GlobalKeys {
            commit: Some("abc".into()),
            ..keys()
        };
        assert!(!EntryPointPolicy.keys_match(&keys(), &commit));
    }

    #[test]
    fn associated_sensitive_to_asset_parameters() {
        let policy = AssociatedPolicy::new();
        let density = GlobalKeys {
            pixel_density: Some(2.0),
            ..keys()
        };
        let css = GlobalKeys {
            css_urls: vec!["https://cdn.example/a.css".into()],
            ..keys()
        };
        assert!(policy.keys_match(&keys(), &keys()));
        assert!(!policy.keys_match(&keys(), &density));
        assert!(!policy.keys_match(&keys(), &css));
    }

    #[test]
    fn associated_entry_predicate() {
        let policy = AssociatedPolicy::new().with_association("/views/home.tmpl", "/src/home.ts");
        let matching = CacheEntry {
            association: Some("/src/home.ts".into()),
            ..CacheEntry::default()
        };
        let changed = CacheEntry {
            association: Some("/src/other.ts".into()),
            ..CacheEntry::default()
        };
        let home = Path::new("/views/home.tmpl");
        assert!(!policy.entry_is_invalid(home, &matching));
        assert!(policy.entry_is_invalid(home, &changed));
        assert!(policy.entry_is_invalid(home, &CacheEntry::default()));
        // Paths without a requested association must not carry one
        assert!(!policy.entry_is_invalid(Path::new("/src/util.ts"), &CacheEntry::default()));
        assert!(policy.entry_is_invalid(Path::new("/src/util.ts"), &matching));
    }
}
