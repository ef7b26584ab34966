//! Name resolution: export tables, import binding and free identifiers.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tessera_common::{Ident, Interner};

use crate::error::BundleError;
use crate::ids::{Binding, DeclId, UnitId};
use crate::module::{Export, ImportItem, Reference};
use crate::unit::{lookup_export, namespace_of, CompilationUnit};

/// Resolves the names of every unit, in unit order.
///
/// A unit's dependencies precede it, so every exporter it imports from has
/// its export table built by the time the unit is processed.
pub(crate) fn resolve_names(units: &mut [CompilationUnit], interner: &Interner) -> Result<(), BundleError> {
    let ids: HashMap<PathBuf, UnitId> = units.iter().map(|u| (u.path.clone(), u.id)).collect();
    for i in 0..units.len() {
        let (done, rest) = units.split_at_mut(i);
        let mut scope = Scope {
            done,
            ids: &ids,
            interner,
            unit: &mut rest[0],
        };
        scope.bind_declarations();
        scope.bind_imports()?;
        scope.build_exports()?;
        scope.resolve_references()?;
    }
    Ok(())
}

/// Name resolution state for one unit.
struct Scope<'s> {
    done: &'s [CompilationUnit],
    ids: &'s HashMap<PathBuf, UnitId>,
    interner: &'s Interner,
    unit: &'s mut CompilationUnit,
}

impl Scope<'_> {
    fn name(&self, ident: Ident) -> String {
        self.interner.resolve(ident).to_string()
    }

    fn source_id(&self, source: &Path) -> Result<UnitId, BundleError> {
        self.ids
            .get(source)
            .copied()
            .ok_or_else(|| BundleError::UnresolvedDependency {
                path: source.to_path_buf(),
                referenced_by: Some(self.unit.path.clone()),
            })
    }

    /// Binds top-level declarations. The first declaration of a name wins.
    fn bind_declarations(&mut self) {
        let unit_id = self.unit.id;
        let module = &self.unit.module;
        for (index, decl) in module.declarations.iter().enumerate() {
            self.unit
                .bindings
                .entry(decl.name)
                .or_insert(Binding::Decl(DeclId::new(unit_id, index)));
        }
    }

    fn bind_imports(&mut self) -> Result<(), BundleError> {
        let module = std::sync::Arc::clone(&self.unit.module);
        for import in &module.imports {
            if self.unit.bindings.contains_key(&import.local) {
                return Err(BundleError::DuplicateImport {
                    path: self.unit.path.clone(),
                    name: self.name(import.local),
                });
            }
            let source = self.source_id(&import.source)?;
            let binding = match import.item {
                ImportItem::Namespace => Binding::Namespace(source),
                ImportItem::Named(name) => lookup_export(self.done, source, name).ok_or_else(|| {
                    BundleError::NameNotFound {
                        path: self.unit.path.clone(),
                        name: self.name(name),
                        exporter: Some(import.source.clone()),
                    }
                })?,
            };
            self.unit.bindings.insert(import.local, binding);
        }
        Ok(())
    }

    fn build_exports(&mut self) -> Result<(), BundleError> {
        let module = std::sync::Arc::clone(&self.unit.module);
        for export in &module.exports {
            match export {
                Export::Local { name, local } => {
                    let binding = self.unit.binding(*local).ok_or_else(|| BundleError::NameNotFound {
                        path: self.unit.path.clone(),
                        name: self.name(*local),
                        exporter: None,
                    })?;
                    if self.unit.exports.insert(*name, binding).is_some() {
                        return Err(BundleError::DuplicateExport {
                            path: self.unit.path.clone(),
                            name: self.name(*name),
                        });
                    }
                }
                Export::All { source } => {
                    let source = self.source_id(source)?;
                    self.unit.reexports.push(source);
                }
            }
        }
        Ok(())
    }

    fn resolve_references(&mut self) -> Result<(), BundleError> {
        let module = std::sync::Arc::clone(&self.unit.module);
        let mut decl_refs = Vec::with_capacity(module.declarations.len());
        for decl in &module.declarations {
            let refs = decl
                .references
                .iter()
                .map(|r| self.resolve(r))
                .collect::<Result<Vec<_>, _>>()?;
            decl_refs.push(refs);
        }
        let effect_refs = module
            .effects
            .iter()
            .map(|r| self.resolve(r))
            .collect::<Result<Vec<_>, _>>()?;
        self.unit.decl_refs = decl_refs;
        self.unit.effect_refs = effect_refs;
        Ok(())
    }

    fn resolve(&self, reference: &Reference) -> Result<Binding, BundleError> {
        match *reference {
            Reference::Name(name) => self.unit.binding(name).ok_or_else(|| BundleError::NameNotFound {
                path: self.unit.path.clone(),
                name: self.name(name),
                exporter: None,
            }),
            Reference::Member { object, member } => match self.unit.binding(object) {
                Some(Binding::Namespace(source)) => namespace_of(self.done, source)
                    .get(&member)
                    .copied()
                    .ok_or_else(|| BundleError::NameNotFound {
                        path: self.unit.path.clone(),
                        name: format!("{}.{}", self.name(object), self.name(member)),
                        exporter: Some(self.done[source.index()].path.clone()),
                    }),
                Some(binding) => Ok(binding),
                None => Err(BundleError::NameNotFound {
                    path: self.unit.path.clone(),
                    name: self.name(object),
                    exporter: None,
                }),
            },
        }
    }
}
