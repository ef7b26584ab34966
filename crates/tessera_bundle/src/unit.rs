//! Compilation units and the state the pipeline phases attach to them.

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

use tessera_common::Ident;

use crate::frontend::TypeTag;
use crate::ids::{Binding, UnitId};
use crate::module::ParsedModule;

/// One source file in a bundle.
///
/// Created by dependency resolution, then filled in phase by phase. After a
/// successful finalize it is immutable.
#[derive(Debug)]
pub struct CompilationUnit {
    /// Position in the bundle's unit order.
    pub id: UnitId,
    /// Absolute, canonical path identifying the unit.
    pub path: PathBuf,
    /// The parsed module, shared with the parse cache.
    pub module: Arc<ParsedModule>,
    /// Effective dependencies, in first-seen order. Every one precedes this
    /// unit in the bundle order.
    pub dependencies: Vec<UnitId>,
    /// Whether the unit was requested as an entry point.
    pub is_entry: bool,

    /// Exported name → binding. Filled by name resolution.
    pub(crate) exports: BTreeMap<Ident, Binding>,
    /// Units whose exports this unit re-exports wholesale, in source order.
    pub(crate) reexports: Vec<UnitId>,
    /// Local name → binding, for declarations and imports.
    pub(crate) bindings: HashMap<Ident, Binding>,
    /// Resolved references of each declaration, parallel to
    /// `module.declarations[i].references`.
    pub(crate) decl_refs: Vec<Vec<Binding>>,
    /// Resolved references of top-level effects.
    pub(crate) effect_refs: Vec<Binding>,
    /// Synthetic namespace object, computed on first access.
    pub(crate) namespace: OnceCell<BTreeMap<Ident, Binding>>,
    /// Type of each declaration. Filled by type evaluation.
    pub(crate) types: Vec<Option<TypeTag>>,
    /// Liveness of each declaration. Filled by activity analysis.
    pub(crate) live: Vec<bool>,
    /// Whether the namespace object is used as a value.
    pub(crate) namespace_used: bool,
}

impl CompilationUnit {
    /// Creates a unit with no phase state.
    pub fn new(id: UnitId, path: PathBuf, module: Arc<ParsedModule>) -> Self {
        Self {
            id,
            path,
            module,
            dependencies: Vec::new(),
            is_entry: false,
            exports: BTreeMap::new(),
            reexports: Vec::new(),
            bindings: HashMap::new(),
            decl_refs: Vec::new(),
            effect_refs: Vec::new(),
            namespace: OnceCell::new(),
            types: Vec::new(),
            live: Vec::new(),
            namespace_used: false,
        }
    }

    /// Returns the binding of an exported name declared by this unit itself.
    /// Aggregate re-exports are not consulted.
    pub fn export(&self, name: Ident) -> Option<Binding> {
        self.exports.get(&name).copied()
    }

    /// Returns what the local identifier `local` is bound to.
    pub fn binding(&self, local: Ident) -> Option<Binding> {
        self.bindings.get(&local).copied()
    }

    /// Returns the resolved references of declaration `decl`.
    pub fn references(&self, decl: usize) -> &[Binding] {
        self.decl_refs.get(decl).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Returns the type computed for declaration `decl`.
    pub fn decl_type(&self, decl: usize) -> Option<&TypeTag> {
        self.types.get(decl)?.as_ref()
    }

    /// Returns `true` if declaration `decl` is live.
    pub fn is_live(&self, decl: usize) -> bool {
        self.live.get(decl).copied().unwrap_or(false)
    }

    /// Returns `true` if the namespace object is used as a value.
    pub fn namespace_used(&self) -> bool {
        self.namespace_used
    }
}

/// Returns the namespace object of `id`: its own exports plus, for names it
/// doesn't export itself, the namespaces of its aggregate re-exports in
/// source order. Computed once and cached on the unit.
///
/// `units` must contain `id` and every unit it re-exports.
pub(crate) fn namespace_of(units: &[CompilationUnit], id: UnitId) -> &BTreeMap<Ident, Binding> {
    let unit = &units[id.index()];
    unit.namespace.get_or_init(|| {
        let mut members = unit.exports.clone();
        for &source in &unit.reexports {
            for (name, binding) in namespace_of(units, source) {
                members.entry(*name).or_insert(*binding);
            }
        }
        members
    })
}

/// Looks up an exported name of `id`: its own export table first, then its
/// aggregate re-exports in source order.
pub(crate) fn lookup_export(units: &[CompilationUnit], id: UnitId, name: Ident) -> Option<Binding> {
    let unit = &units[id.index()];
    if let Some(binding) = unit.exports.get(&name) {
        return Some(*binding);
    }
    unit.reexports
        .iter()
        .find_map(|&source| lookup_export(units, source, name))
}
