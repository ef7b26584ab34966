//! Per-run build reports.

use std::collections::BTreeSet;
use std::path::PathBuf;

/// What one build run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    /// Target name.
    pub target: String,
    /// Roots compiled in this run, in build order.
    pub rebuilt: Vec<PathBuf>,
    /// Roots found up to date.
    pub skipped: Vec<PathBuf>,
    /// Every unit compiled in this run.
    pub compiled: BTreeSet<PathBuf>,
    /// Cache entries collected as unreachable when the cache was saved.
    pub collected: usize,
}

impl BuildReport {
    /// Creates an empty report for `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Returns `true` if nothing had to be rebuilt.
    pub fn is_up_to_date(&self) -> bool {
        self.rebuilt.is_empty()
    }
}
