//! Dependency discovery and build ordering.
//!
//! [`Resolver::resolve`] loads the entry units, follows every dependency the
//! front end reports until no unknown path remains, and orders the result
//! so that every unit comes after all of its dependencies.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tessera_cache::Cache;
use tessera_common::Interner;
use tracing::{debug, trace};

use crate::error::{BundleError, ParseError};
use crate::frontend::Frontend;
use crate::ids::UnitId;
use crate::module::ParsedModule;
use crate::parse_cache::ParseCache;
use crate::unit::CompilationUnit;

/// A parsed unit before ordering.
struct Loaded {
    module: Arc<ParsedModule>,
    dependencies: Vec<PathBuf>,
}

/// Loads units through a front end, optionally via a shared [`ParseCache`].
pub struct Resolver<'a> {
    frontend: &'a dyn Frontend,
    interner: &'a Interner,
    parse_cache: Option<&'a ParseCache>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver parsing directly through `frontend`.
    pub fn new(frontend: &'a dyn Frontend, interner: &'a Interner) -> Self {
        Self {
            frontend,
            interner,
            parse_cache: None,
        }
    }

    /// Reuses parses from `cache`.
    pub fn with_parse_cache(mut self, cache: &'a ParseCache) -> Self {
        self.parse_cache = Some(cache);
        self
    }

    /// Resolves the transitive closure of `entries` into ordered units.
    ///
    /// When `cache` is given, every loaded unit is restarted in it and every
    /// discovered edge recorded, so the cache mirrors this build's graph.
    ///
    /// # Errors
    ///
    /// [`BundleError::UnresolvedDependency`] if a path doesn't exist,
    /// [`BundleError::Parse`] for other front-end failures, and
    /// [`BundleError::CircularDependency`] if the units can't be ordered.
    pub fn resolve(
        &self,
        entries: &[PathBuf],
        mut cache: Option<&mut Cache>,
    ) -> Result<Vec<CompilationUnit>, BundleError> {
        let mut loaded: BTreeMap<PathBuf, Loaded> = BTreeMap::new();
        let mut queue: VecDeque<(PathBuf, Option<PathBuf>)> =
            entries.iter().map(|p| (p.clone(), None)).collect();

        while let Some((path, referenced_by)) = queue.pop_front() {
            if loaded.contains_key(&path) {
                continue;
            }
            let module = self.load(&path, referenced_by)?;
            let dependencies = module.effective_dependencies();
            trace!(path = %path.display(), deps = dependencies.len(), "loaded unit");

            if let Some(cache) = cache.as_deref_mut() {
                cache.start_update(&path);
                for dep in &dependencies {
                    cache.add_dependency(&path, dep);
                }
            }
            for dep in &dependencies {
                if !loaded.contains_key(dep) {
                    queue.push_back((dep.clone(), Some(path.clone())));
                }
            }
            loaded.insert(path, Loaded { module, dependencies });
        }

        let graph: BTreeMap<PathBuf, Vec<PathBuf>> = loaded
            .iter()
            .map(|(path, unit)| (path.clone(), unit.dependencies.clone()))
            .collect();
        let order = order_units(&graph)?;
        debug!(units = order.len(), "dependencies resolved");

        let ids: HashMap<&Path, UnitId> = order
            .iter()
            .enumerate()
            .map(|(i, path)| (path.as_path(), UnitId::from_raw(i as u32)))
            .collect();
        let entry_set: HashSet<&Path> = entries.iter().map(PathBuf::as_path).collect();

        let mut units = Vec::with_capacity(order.len());
        for path in &order {
            let Some(unit) = loaded.get(path) else {
                continue;
            };
            let id = ids[path.as_path()];
            let mut compiled = CompilationUnit::new(id, path.clone(), Arc::clone(&unit.module));
            compiled.dependencies = unit
                .dependencies
                .iter()
                .filter_map(|dep| ids.get(dep.as_path()).copied())
                .collect();
            compiled.is_entry = entry_set.contains(path.as_path());
            units.push(compiled);
        }
        Ok(units)
    }

    fn load(&self, path: &Path, referenced_by: Option<PathBuf>) -> Result<Arc<ParsedModule>, BundleError> {
        let parsed = match self.parse_cache {
            Some(cache) => cache.get_or_parse(path, self.frontend, self.interner),
            None => self.frontend.parse(path, self.interner).map(Arc::new),
        };
        parsed.map_err(|e| match e {
            ParseError::NotFound { path } => BundleError::UnresolvedDependency { path, referenced_by },
            other => BundleError::Parse(other),
        })
    }
}

/// Orders `graph` (unit → dependencies) so every dependency precedes its
/// dependents.
///
/// Units are placed in passes: each pass appends, sorted by path, every unit
/// whose dependencies were all placed by earlier passes. Every dependency
/// must itself be a key of `graph`.
///
/// # Errors
///
/// Returns [`BundleError::CircularDependency`] if a pass places nothing.
pub fn order_units(graph: &BTreeMap<PathBuf, Vec<PathBuf>>) -> Result<Vec<PathBuf>, BundleError> {
    let mut placed: HashSet<&Path> = HashSet::with_capacity(graph.len());
    let mut remaining: BTreeSet<&Path> = graph.keys().map(PathBuf::as_path).collect();
    let mut order = Vec::with_capacity(graph.len());

    while !remaining.is_empty() {
        let batch: Vec<&Path> = remaining
            .iter()
            .copied()
            .filter(|path| graph[*path].iter().all(|dep| placed.contains(dep.as_path())))
            .collect();
        if batch.is_empty() {
            return Err(BundleError::CircularDependency {
                chain: find_cycle(graph, &remaining, &placed),
            });
        }
        for path in batch {
            remaining.remove(path);
            placed.insert(path);
            order.push(path.to_path_buf());
        }
    }
    Ok(order)
}

/// Walks from the alphabetically first stuck unit along its first unplaced
/// dependency until a unit repeats, and returns the cycle it closes.
fn find_cycle(
    graph: &BTreeMap<PathBuf, Vec<PathBuf>>,
    stuck: &BTreeSet<&Path>,
    placed: &HashSet<&Path>,
) -> Vec<PathBuf> {
    let Some(&start) = stuck.iter().next() else {
        return Vec::new();
    };
    let mut stack: Vec<&Path> = vec![start];
    loop {
        let current = stack[stack.len() - 1];
        let next = graph
            .get(current)
            .into_iter()
            .flatten()
            .map(PathBuf::as_path)
            .filter(|dep| !placed.contains(dep))
            .min();
        let Some(next) = next else {
            // Unreachable for a stuck unit; report the walk so far.
            return stack.iter().map(|p| p.to_path_buf()).collect();
        };
        if let Some(pos) = stack.iter().position(|p| *p == next) {
            let mut chain: Vec<PathBuf> = stack[pos..].iter().map(|p| p.to_path_buf()).collect();
            chain.push(next.to_path_buf());
            return chain;
        }
        stack.push(next);
    }
}
