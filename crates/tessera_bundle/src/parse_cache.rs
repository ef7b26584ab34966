//! Parsed modules shared across build requests.
//!
//! Parsing dominates the cost of a rebuild, and a long-lived process builds
//! the same files for several targets. The cache maps a path to its last
//! parse and hands the same [`Arc<ParsedModule>`] to every request until the
//! file's modification time changes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use tessera_common::{Interner, Timestamp};
use tracing::trace;

use crate::error::ParseError;
use crate::frontend::Frontend;
use crate::module::ParsedModule;

#[derive(Debug)]
struct CachedParse {
    mtime: Timestamp,
    module: Arc<ParsedModule>,
}

/// Thread-safe path → parsed module map.
///
/// Lookups take a read lock. A miss parses without holding any lock and
/// takes the write lock only to insert; if another thread inserted a parse
/// of the same file version in the meantime, that one wins.
#[derive(Debug, Default)]
pub struct ParseCache {
    entries: RwLock<HashMap<PathBuf, CachedParse>>,
}

impl ParseCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the parse of `path`, reusing the cached one if the file's
    /// modification time is unchanged. Files whose modification time is
    /// unknown are parsed on every call and never cached.
    pub fn get_or_parse(
        &self,
        path: &Path,
        frontend: &dyn Frontend,
        interner: &Interner,
    ) -> Result<Arc<ParsedModule>, ParseError> {
        let Some(mtime) = Timestamp::of_file(path) else {
            return frontend.parse(path, interner).map(Arc::new);
        };

        if let Some(cached) = self.entries.read().get(path) {
            if cached.mtime == mtime {
                trace!(path = %path.display(), "parse cache hit");
                return Ok(Arc::clone(&cached.module));
            }
        }

        let module = Arc::new(frontend.parse(path, interner)?);

        let mut entries = self.entries.write();
        if let Some(cached) = entries.get(path) {
            if cached.mtime == mtime {
                return Ok(Arc::clone(&cached.module));
            }
        }
        trace!(path = %path.display(), "parse cache insert");
        entries.insert(
            path.to_path_buf(),
            CachedParse {
                mtime,
                module: Arc::clone(&module),
            },
        );
        Ok(module)
    }

    /// Drops the cached parse of `path`.
    pub fn invalidate(&self, path: &Path) {
        self.entries.write().remove(path);
    }

    /// Drops every cached parse.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Number of cached parses.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
