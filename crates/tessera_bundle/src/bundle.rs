//! The bundle pipeline.
//!
//! A [`Bundle`] collects entry paths, runs the finalize phases in order and
//! serializes the result into an in-memory [`Artifact`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use tessera_cache::Cache;
use tessera_common::Interner;
use tracing::debug;

use crate::error::BundleError;
use crate::frontend::{Frontend, UnitView};
use crate::ids::UnitId;
use crate::naming::{assign_names, NameTable};
use crate::parse_cache::ParseCache;
use crate::resolver::Resolver;
use crate::unit::CompilationUnit;
use crate::{activity, names, types};

/// Finalize phases, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Discover and order units.
    ResolveDependencies,
    /// Build export tables and bind every identifier.
    ResolveNames,
    /// Compute declaration types.
    EvalTypes,
    /// Mark live declarations.
    ResolveActivity,
    /// Assign final identifiers.
    UniqueNames,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::ResolveDependencies => "resolve-dependencies",
            Phase::ResolveNames => "resolve-names",
            Phase::EvalTypes => "eval-types",
            Phase::ResolveActivity => "resolve-activity",
            Phase::UniqueNames => "unique-names",
        };
        f.write_str(name)
    }
}

/// Build-wide parameters of a bundle.
#[derive(Debug, Clone, Default)]
pub struct BundleOptions {
    /// Use short generated names instead of source spellings.
    pub compact: bool,
    /// Global constant definitions (name → value), emitted after the prelude.
    pub defines: BTreeMap<String, String>,
}

/// The serialized output of a bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Generated code.
    pub bytes: Vec<u8>,
    /// Every final identifier the bundle declares.
    pub used_names: BTreeSet<String>,
}

/// A set of entry units compiled into one artifact.
pub struct Bundle<'a> {
    frontend: &'a dyn Frontend,
    interner: &'a Interner,
    parse_cache: Option<&'a ParseCache>,
    options: BundleOptions,
    entries: Vec<PathBuf>,
    units: Vec<CompilationUnit>,
    names: NameTable,
    finalized: bool,
}

impl<'a> Bundle<'a> {
    /// Creates an empty bundle compiled by `frontend`.
    pub fn new(frontend: &'a dyn Frontend, interner: &'a Interner) -> Self {
        Self {
            frontend,
            interner,
            parse_cache: None,
            options: BundleOptions::default(),
            entries: Vec::new(),
            units: Vec::new(),
            names: NameTable::default(),
            finalized: false,
        }
    }

    /// Reuses parses from a cache shared with other bundles.
    pub fn with_parse_cache(mut self, cache: &'a ParseCache) -> Self {
        self.parse_cache = Some(cache);
        self
    }

    /// Sets the build-wide parameters.
    pub fn with_options(mut self, options: BundleOptions) -> Self {
        self.options = options;
        self
    }

    /// Adds an entry unit. Its exports are always live.
    pub fn add_entry(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.entries.contains(&path) {
            self.entries.push(path);
        }
        self.finalized = false;
    }

    /// The entry paths, in insertion order.
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Runs every phase in order, stopping at the first error.
    ///
    /// When `cache` is given, dependency resolution records this build's
    /// graph in it. On error the bundle stays unfinalized and can't be
    /// written.
    pub fn finalize(&mut self, cache: Option<&mut Cache>) -> Result<(), BundleError> {
        self.finalized = false;
        self.units.clear();
        self.names = NameTable::default();

        debug!(phase = %Phase::ResolveDependencies, entries = self.entries.len(), "running phase");
        let mut resolver = Resolver::new(self.frontend, self.interner);
        if let Some(parse_cache) = self.parse_cache {
            resolver = resolver.with_parse_cache(parse_cache);
        }
        let mut units = resolver.resolve(&self.entries, cache)?;

        debug!(phase = %Phase::ResolveNames, units = units.len(), "running phase");
        names::resolve_names(&mut units, self.interner)?;

        debug!(phase = %Phase::EvalTypes, "running phase");
        types::eval_types(&mut units, self.frontend, self.interner)?;

        debug!(phase = %Phase::ResolveActivity, "running phase");
        activity::resolve_activity(&mut units);

        debug!(phase = %Phase::UniqueNames, compact = self.options.compact, "running phase");
        let reserved = self
            .frontend
            .reserved_words()
            .iter()
            .copied()
            .chain(self.options.defines.keys().map(String::as_str));
        self.names = assign_names(&units, self.interner, reserved, self.options.compact)?;

        self.units = units;
        self.finalized = true;
        Ok(())
    }

    /// Returns `true` after a successful [`finalize`](Self::finalize).
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// The units in bundle order. Empty until finalized.
    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    /// Returns a unit by ID.
    pub fn unit(&self, id: UnitId) -> Option<&CompilationUnit> {
        self.units.get(id.index())
    }

    /// Returns the unit for `path`.
    pub fn unit_by_path(&self, path: &Path) -> Option<&CompilationUnit> {
        self.units.iter().find(|u| u.path == path)
    }

    /// The final names assigned by the last finalize.
    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Serializes the bundle: the front end's prelude, then the global
    /// constants in name order, then every unit in bundle order.
    ///
    /// # Errors
    ///
    /// [`BundleError::NotFinalized`] unless the last finalize succeeded;
    /// [`BundleError::Emit`] if the front end fails on a unit.
    pub fn write(&self) -> Result<Artifact, BundleError> {
        if !self.finalized {
            return Err(BundleError::NotFinalized);
        }
        let mut bytes = Vec::new();
        bytes.extend_from_slice(self.frontend.prelude().as_bytes());
        for (name, value) in &self.options.defines {
            self.frontend.emit_define(name, value, &mut bytes);
        }
        for unit in &self.units {
            let view = UnitView::new(unit, &self.names, self.interner);
            self.frontend
                .emit(&view, &mut bytes)
                .map_err(|message| BundleError::Emit {
                    path: unit.path.clone(),
                    message,
                })?;
        }
        Ok(Artifact {
            bytes,
            used_names: self.names.used_names(),
        })
    }
}
