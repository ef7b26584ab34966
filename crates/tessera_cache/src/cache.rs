//! The cache engine shared by every cache variant.
//!
//! A `Cache` is loaded once per build target, answers staleness queries for
//! the builder, records what every compiled source depended on, and is saved
//! at the end of the build after unreachable entries are collected.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tessera_common::Timestamp;
use tracing::{debug, trace, warn};

use crate::entry::CacheEntry;
use crate::error::CacheError;
use crate::freshness::StalenessCheck;
use crate::keys::GlobalKeys;
use crate::manifest::{cache_file_path, CacheManifest, FORMAT_VERSION};
use crate::policy::InvalidationPolicy;

/// Parameters for [`Cache::load`].
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Directory holding cache files.
    pub cache_dir: PathBuf,
    /// Output path of the target. Determines the cache file name.
    pub target_output: PathBuf,
    /// Global keys of the current build.
    pub keys: GlobalKeys,
    /// Ignore any persisted state.
    pub force: bool,
}

/// Why persisted cache state was thrown away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscardReason {
    /// The build was forced.
    Forced,
    /// The cache file could not be decoded.
    Corrupt,
    /// The cache file was written by an incompatible format version.
    FormatVersion,
    /// The cache file was written under a different policy kind.
    PolicyKind,
    /// A global key the policy cares about changed.
    KeysChanged,
}

/// What [`Cache::load`] found on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No cache file existed.
    Missing,
    /// The persisted state was reused.
    Loaded {
        /// Number of entries loaded.
        entries: usize,
    },
    /// A cache file existed but its state was discarded.
    Discarded(DiscardReason),
}

/// Incremental build cache for one target.
pub struct Cache {
    file: PathBuf,
    target: PathBuf,
    keys: GlobalKeys,
    policy: Box<dyn InvalidationPolicy>,
    entries: BTreeMap<PathBuf, CacheEntry>,
    outputs: BTreeMap<PathBuf, PathBuf>,
    age: Option<Timestamp>,
    started_at: Timestamp,
    roots: BTreeSet<PathBuf>,
    outcome: LoadOutcome,
}

impl Cache {
    /// Loads the cache of the target described by `options`.
    ///
    /// Persisted state is discarded, leaving an empty cache with no age, when
    /// the build is forced, the file can't be decoded, or its format version,
    /// policy kind or relevant global keys differ from the current build.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::DirectoryConflict`] if a directory sits where
    /// the cache file belongs, and [`CacheError::Io`] if it can't be read.
    pub fn load(
        options: LoadOptions,
        policy: impl InvalidationPolicy + 'static,
    ) -> Result<Self, CacheError> {
        let file = cache_file_path(&options.cache_dir, &options.target_output);
        let mut cache = Self {
            file,
            target: options.target_output,
            keys: options.keys,
            policy: Box::new(policy),
            entries: BTreeMap::new(),
            outputs: BTreeMap::new(),
            age: None,
            started_at: Timestamp::now(),
            roots: BTreeSet::new(),
            outcome: LoadOutcome::Missing,
        };

        if options.force {
            if cache.file.is_dir() {
                return Err(CacheError::DirectoryConflict { path: cache.file });
            }
            debug!(file = %cache.file.display(), "forced build, ignoring cache");
            cache.outcome = LoadOutcome::Discarded(DiscardReason::Forced);
            return Ok(cache);
        }

        let manifest = match CacheManifest::load(&cache.file) {
            Ok(Some(manifest)) => manifest,
            Ok(None) => {
                debug!(file = %cache.file.display(), "no cache file");
                return Ok(cache);
            }
            Err(CacheError::Decode { path, reason }) => {
                warn!(file = %path.display(), %reason, "discarding unreadable cache");
                cache.outcome = LoadOutcome::Discarded(DiscardReason::Corrupt);
                return Ok(cache);
            }
            Err(e) => return Err(e),
        };

        let reason = if manifest.format_version != FORMAT_VERSION {
            Some(DiscardReason::FormatVersion)
        } else if manifest.policy != cache.policy.kind() {
            Some(DiscardReason::PolicyKind)
        } else if !cache.policy.keys_match(&manifest.keys, &cache.keys) {
            Some(DiscardReason::KeysChanged)
        } else {
            None
        };
        if let Some(reason) = reason {
            debug!(file = %cache.file.display(), ?reason, "discarding cache");
            cache.outcome = LoadOutcome::Discarded(reason);
            return Ok(cache);
        }

        debug!(
            file = %cache.file.display(),
            entries = manifest.entries.len(),
            "loaded cache"
        );
        cache.outcome = LoadOutcome::Loaded {
            entries: manifest.entries.len(),
        };
        cache.age = manifest.built_at;
        cache.entries = manifest.entries;
        cache.outputs = manifest.outputs;
        Ok(cache)
    }

    /// Returns `true` if `path`, or anything it transitively depends on, must
    /// be rebuilt.
    ///
    /// Files are measured against the start of the build that saved the
    /// cache. Under a policy that measures root age, a root with a recorded
    /// output is measured against its destination file instead.
    pub fn requires_update(&self, path: &Path) -> bool {
        let age = match self.outputs.get(path) {
            Some(dest) if self.policy.measures_root_age() => Timestamp::of_file(dest),
            _ => self.age,
        };
        let probe = |p: &Path| Timestamp::of_file(p);
        let stale = StalenessCheck::new(&self.entries, self.policy.as_ref(), age, &probe)
            .requires_update(path);
        trace!(path = %path.display(), stale, "staleness check");
        stale
    }

    /// Returns the entry for `path`, creating an empty one if absent.
    pub fn ensure_entry(&mut self, path: &Path) -> &mut CacheEntry {
        self.entries.entry(path.to_path_buf()).or_default()
    }

    /// Starts recompiling `path`: clears its recorded dependencies, records
    /// its current modification time and marks it as reached in this build.
    ///
    /// The association is kept. A root may be reloaded as a dependency of
    /// another root, which must not invalidate it; the association only
    /// changes through [`set_association`](Self::set_association) and
    /// [`clear_association`](Self::clear_association).
    pub fn start_update(&mut self, path: &Path) {
        let mtime = Timestamp::of_file(path);
        let entry = self.ensure_entry(path);
        entry.dependencies.clear();
        entry.mtime = mtime;
        entry.touched = true;
    }

    /// Records that `path` depends on `dep`.
    pub fn add_dependency(&mut self, path: &Path, dep: &Path) {
        self.ensure_entry(path).add_dependency(dep.to_path_buf());
    }

    /// Records the associated unit of `path`.
    pub fn set_association(&mut self, path: &Path, association: impl Into<String>) {
        self.ensure_entry(path).association = Some(association.into());
    }

    /// Records that `path` has no associated unit.
    pub fn clear_association(&mut self, path: &Path) {
        if let Some(entry) = self.entries.get_mut(path) {
            entry.association = None;
        }
    }

    /// Records that `source` is compiled to its own artifact at `dest`.
    pub fn set_output(&mut self, source: &Path, dest: &Path) {
        self.outputs
            .insert(source.to_path_buf(), dest.to_path_buf());
    }

    /// Registers `path` as a root of this build. Only entries reachable from
    /// a root survive [`clean`](Self::clean).
    pub fn add_root(&mut self, path: &Path) {
        self.roots.insert(path.to_path_buf());
    }

    /// Forgets everything recorded for `path` after a failed compilation, so
    /// the next build retries it. Other entries are untouched.
    pub fn rollback(&mut self, path: &Path) {
        debug!(path = %path.display(), "rolling back cache entry");
        self.entries.remove(path);
        self.outputs.remove(path);
    }

    /// Deletes every entry not reachable from a registered root, along with
    /// output records of deleted sources. Returns the number of entries
    /// deleted.
    ///
    /// With no registered roots nothing is reachable, so every entry goes.
    pub fn clean(&mut self) -> usize {
        for entry in self.entries.values_mut() {
            entry.touched = false;
        }

        let mut stack: Vec<PathBuf> = self.roots.iter().cloned().collect();
        while let Some(path) = stack.pop() {
            let Some(entry) = self.entries.get_mut(&path) else {
                continue;
            };
            if entry.touched {
                continue;
            }
            entry.touched = true;
            stack.extend(entry.dependencies.iter().cloned());
        }

        let before = self.entries.len();
        self.entries.retain(|path, entry| {
            if !entry.touched {
                trace!(path = %path.display(), "collecting unreachable entry");
            }
            entry.touched
        });
        let entries = &self.entries;
        self.outputs.retain(|source, _| entries.contains_key(source));
        before - self.entries.len()
    }

    /// Collects unreachable entries and persists the cache. The saved age is
    /// the moment this cache was loaded, so files modified during the build
    /// are seen as stale next time. Returns the number of entries collected.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the cache file can't be written.
    pub fn save(&mut self) -> Result<usize, CacheError> {
        let removed = self.clean();
        let mut manifest = CacheManifest::new(self.policy.kind(), &self.target, self.keys.clone());
        manifest.built_at = Some(self.started_at);
        manifest.entries = self.entries.clone();
        manifest.outputs = self.outputs.clone();
        manifest.save(&self.file)?;
        debug!(
            file = %self.file.display(),
            entries = self.entries.len(),
            removed,
            "saved cache"
        );
        Ok(removed)
    }

    /// Returns the entry recorded for `path`.
    pub fn entry(&self, path: &Path) -> Option<&CacheEntry> {
        self.entries.get(path)
    }

    /// Iterates over all recorded source paths.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.keys().map(PathBuf::as_path)
    }

    /// Returns the destination recorded for `source`.
    pub fn output(&self, source: &Path) -> Option<&Path> {
        self.outputs.get(source).map(PathBuf::as_path)
    }

    /// Start time of the build that saved the loaded state.
    pub fn age(&self) -> Option<Timestamp> {
        self.age
    }

    /// Path of the cache file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// What was found on disk when loading.
    pub fn outcome(&self) -> LoadOutcome {
        self.outcome
    }
}
