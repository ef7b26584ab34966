//! The build driver.
//!
//! Loads a target's cache, decides which roots are stale, runs the bundle
//! pipeline for them, writes artifacts and saves the cache. Bundled targets
//! compile every root into one artifact; view targets compile each root into
//! its own artifact, stopping at the first failing root while keeping the
//! ones built before it.

use std::path::Path;

use tessera_bundle::{Bundle, BundleOptions, Frontend, ParseCache};
use tessera_cache::Cache;
use tessera_common::Interner;
use tessera_config::{ResolvedRoot, ResolvedTarget};
use tracing::{debug, info, warn};

use crate::error::BuildError;
use crate::output::write_atomic;
use crate::report::BuildReport;
use crate::target::{association, load_cache};

/// Builds targets with one front end.
pub struct Builder<'a> {
    frontend: &'a dyn Frontend,
    interner: &'a Interner,
    parse_cache: Option<&'a ParseCache>,
}

impl<'a> Builder<'a> {
    /// Creates a builder compiling with `frontend`.
    pub fn new(frontend: &'a dyn Frontend, interner: &'a Interner) -> Self {
        Self {
            frontend,
            interner,
            parse_cache: None,
        }
    }

    /// Shares parses across every build run by this builder.
    pub fn with_parse_cache(mut self, cache: &'a ParseCache) -> Self {
        self.parse_cache = Some(cache);
        self
    }

    /// Builds `target`, rebuilding only what changed since its last build.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError::Bundle`] for the first root that fails to
    /// compile, after its cache entry was rolled back and the cache saved.
    pub fn build(&self, target: &ResolvedTarget) -> Result<BuildReport, BuildError> {
        let mut cache = load_cache(target)?;
        info!(
            target = %target.name,
            roots = target.roots.len(),
            outcome = ?cache.outcome(),
            "building target"
        );
        for root in &target.roots {
            cache.add_root(&root.source);
        }

        let mut report = BuildReport::new(&target.name);
        if target.is_bundled() {
            self.build_bundled(target, &mut cache, &mut report)?;
        } else {
            self.build_each(target, &mut cache, &mut report)?;
        }

        report.collected = cache.save()?;
        for unit in &report.compiled {
            debug!(unit = %unit.display(), "compiled");
        }
        info!(
            target = %target.name,
            rebuilt = report.rebuilt.len(),
            skipped = report.skipped.len(),
            collected = report.collected,
            "target built"
        );
        Ok(report)
    }

    fn bundle(&self, target: &ResolvedTarget) -> Bundle<'a> {
        let bundle = Bundle::new(self.frontend, self.interner).with_options(BundleOptions {
            compact: target.build.compact,
            defines: target.defines.clone(),
        });
        match self.parse_cache {
            Some(parses) => bundle.with_parse_cache(parses),
            None => bundle,
        }
    }

    /// All roots into the target's single artifact.
    fn build_bundled(
        &self,
        target: &ResolvedTarget,
        cache: &mut Cache,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let sources: Vec<&Path> = target.roots.iter().map(|r| r.source.as_path()).collect();
        let stale = target.build.force
            || !target.output.exists()
            || sources.iter().any(|s| cache.requires_update(s));
        if !stale {
            debug!(target = %target.name, "up to date");
            report.skipped.extend(sources.iter().map(|s| s.to_path_buf()));
            return Ok(());
        }

        let mut bundle = self.bundle(target);
        for source in &sources {
            bundle.add_entry(*source);
        }
        let result = bundle
            .finalize(Some(&mut *cache))
            .and_then(|()| bundle.write());
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(source) => {
                let error = BuildError::Bundle {
                    root: target.output.clone(),
                    source,
                };
                return Err(fail(cache, &sources, error));
            }
        };
        if let Err(e) = write_atomic(&target.output, &artifact.bytes) {
            return Err(fail(cache, &sources, e));
        }

        report.rebuilt.extend(sources.iter().map(|s| s.to_path_buf()));
        report
            .compiled
            .extend(bundle.units().iter().map(|u| u.path.clone()));
        Ok(())
    }

    /// Each root into its own artifact.
    fn build_each(
        &self,
        target: &ResolvedTarget,
        cache: &mut Cache,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        for root in &target.roots {
            let dest = root.output.as_deref().ok_or_else(|| BuildError::MissingOutput {
                root: root.source.clone(),
            })?;
            if !target.build.force && dest.exists() && !cache.requires_update(&root.source) {
                debug!(root = %root.source.display(), "up to date");
                report.skipped.push(root.source.clone());
                continue;
            }
            debug!(root = %root.source.display(), "rebuilding");
            self.build_root(target, root, dest, cache, report)?;
            report.rebuilt.push(root.source.clone());
        }
        Ok(())
    }

    fn build_root(
        &self,
        target: &ResolvedTarget,
        root: &ResolvedRoot,
        dest: &Path,
        cache: &mut Cache,
        report: &mut BuildReport,
    ) -> Result<(), BuildError> {
        let sources = [root.source.as_path()];
        let mut bundle = self.bundle(target);
        bundle.add_entry(&root.source);
        if let Some(controller) = &root.controller {
            bundle.add_entry(controller);
        }
        let result = bundle
            .finalize(Some(&mut *cache))
            .and_then(|()| bundle.write());
        let artifact = match result {
            Ok(artifact) => artifact,
            Err(source) => {
                let error = BuildError::Bundle {
                    root: root.source.clone(),
                    source,
                };
                return Err(fail(cache, &sources, error));
            }
        };
        if let Err(e) = write_atomic(dest, &artifact.bytes) {
            return Err(fail(cache, &sources, e));
        }

        cache.set_output(&root.source, dest);
        // Resolution restarted every unit of the bundle, including other
        // roots a view includes, so their controller edges go back in too.
        for other in &target.roots {
            if other.source == root.source || bundle.unit_by_path(&other.source).is_some() {
                record_controller(cache, other);
            }
        }
        report
            .compiled
            .extend(bundle.units().iter().map(|u| u.path.clone()));
        Ok(())
    }
}

/// Records the controller edge and association of a view root.
fn record_controller(cache: &mut Cache, root: &ResolvedRoot) {
    match &root.controller {
        Some(controller) => {
            cache.add_dependency(&root.source, controller);
            cache.set_association(&root.source, association(controller));
        }
        None => cache.clear_association(&root.source),
    }
}

/// Rolls back `roots` and saves the cache, so everything built before the
/// failure is kept. Returns `error` unchanged.
fn fail(cache: &mut Cache, roots: &[&Path], error: BuildError) -> BuildError {
    warn!(%error, "build failed");
    for root in roots {
        cache.rollback(root);
    }
    if let Err(e) = cache.save() {
        warn!(error = %e, "failed to save cache after rollback");
    }
    error
}
