//! Staleness detection over the cached dependency graph.
//!
//! A path is stale when it has no entry, when its file changed after the
//! reference age or after its own recorded time, when the policy rejects its
//! entry, or when any recorded dependency is stale.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tessera_common::Timestamp;
use tracing::trace;

use crate::entry::CacheEntry;
use crate::policy::InvalidationPolicy;

/// Memo state of one path during a single staleness query.
///
/// A path absent from the memo has not been visited yet.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visit {
    /// The path is on the current recursion path.
    Computing,
    /// The path requires an update.
    Stale,
    /// The path and everything it depends on are up to date.
    Fresh,
}

/// One staleness query. Holds the per-call memo, so shared dependencies are
/// walked once and dependency cycles terminate.
pub struct StalenessCheck<'a> {
    entries: &'a BTreeMap<PathBuf, CacheEntry>,
    policy: &'a dyn InvalidationPolicy,
    age: Option<Timestamp>,
    probe: &'a dyn Fn(&Path) -> Option<Timestamp>,
    memo: HashMap<PathBuf, Visit>,
}

impl<'a> StalenessCheck<'a> {
    /// Creates a query measuring every file against `age`.
    ///
    /// `probe` reports the current modification time of a path.
    pub fn new(
        entries: &'a BTreeMap<PathBuf, CacheEntry>,
        policy: &'a dyn InvalidationPolicy,
        age: Option<Timestamp>,
        probe: &'a dyn Fn(&Path) -> Option<Timestamp>,
    ) -> Self {
        Self {
            entries,
            policy,
            age,
            probe,
            memo: HashMap::new(),
        }
    }

    /// Returns `true` if `path` or anything it depends on requires an update.
    ///
    /// Re-entering a path that is still being computed answers `true`, so a
    /// dependency cycle is conservatively stale instead of looping.
    pub fn requires_update(&mut self, path: &Path) -> bool {
        match self.memo.get(path) {
            Some(Visit::Computing) => {
                self.memo.insert(path.to_path_buf(), Visit::Stale);
                return true;
            }
            Some(Visit::Stale) => return true,
            Some(Visit::Fresh) => return false,
            None => {}
        }
        self.memo.insert(path.to_path_buf(), Visit::Computing);

        let stale = match self.entries.get(path) {
            None => {
                trace!(path = %path.display(), "no cache entry");
                true
            }
            Some(entry) => {
                self.entry_is_stale(path, entry)
                    || entry
                        .dependencies
                        .iter()
                        .any(|dep| self.requires_update(dep))
            }
        };

        let state = if stale { Visit::Stale } else { Visit::Fresh };
        self.memo.insert(path.to_path_buf(), state);
        stale
    }

    /// Returns the memo state recorded for `path`, if visited.
    pub fn visit(&self, path: &Path) -> Option<Visit> {
        self.memo.get(path).copied()
    }

    /// Checks the entry's own file and policy, ignoring dependencies.
    fn entry_is_stale(&self, path: &Path, entry: &CacheEntry) -> bool {
        if self.policy.entry_is_invalid(path, entry) {
            trace!(path = %path.display(), "entry rejected by policy");
            return true;
        }
        let Some(current) = (self.probe)(path) else {
            trace!(path = %path.display(), "modification time unknown");
            return true;
        };
        if self.age.map_or(true, |age| current > age) {
            trace!(path = %path.display(), "modified after reference age");
            return true;
        }
        entry.mtime.is_some_and(|recorded| current > recorded)
    }
}
