//! The seam between the shared pipeline and a language front end.

use std::fmt;
use std::path::Path;

use tessera_common::{Ident, Interner};

use crate::error::ParseError;
use crate::ids::DeclId;
use crate::module::ParsedModule;
use crate::naming::NameTable;
use crate::unit::CompilationUnit;

/// Opaque type computed by a front end for a declaration.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeTag(pub String);

impl TypeTag {
    /// The type of declarations the front end doesn't type.
    pub fn unknown() -> Self {
        Self("unknown".to_string())
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A language front end: parses files into [`ParsedModule`]s, types
/// declarations and generates code for finalized units.
pub trait Frontend: Send + Sync {
    /// Parses the file at `path`, interning identifiers in `interner`.
    ///
    /// Dependency, import and re-export paths in the result must be absolute
    /// and canonical, since units are identified by path.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NotFound`] if the file doesn't exist.
    fn parse(&self, path: &Path, interner: &Interner) -> Result<ParsedModule, ParseError>;

    /// Computes the type of declaration `decl` of `module`.
    ///
    /// `inputs` holds, for each of the declaration's references, the type of
    /// the referenced declaration if it was already evaluated.
    fn eval_type(
        &self,
        _module: &ParsedModule,
        _decl: usize,
        _inputs: &[Option<TypeTag>],
    ) -> Result<TypeTag, String> {
        Ok(TypeTag::unknown())
    }

    /// Appends the generated code of one finalized unit to `out`.
    fn emit(&self, unit: &UnitView<'_>, out: &mut Vec<u8>) -> Result<(), String>;

    /// Runtime support code emitted once at the start of every bundle.
    fn prelude(&self) -> &str {
        ""
    }

    /// Identifiers that must never be handed out as final names.
    fn reserved_words(&self) -> &[&str] {
        &[]
    }

    /// Appends the definition of global constant `name` to `out`.
    fn emit_define(&self, name: &str, value: &str, out: &mut Vec<u8>);
}

/// Read-only view of a finalized unit handed to [`Frontend::emit`].
pub struct UnitView<'b> {
    unit: &'b CompilationUnit,
    names: &'b NameTable,
    interner: &'b Interner,
}

impl<'b> UnitView<'b> {
    pub(crate) fn new(unit: &'b CompilationUnit, names: &'b NameTable, interner: &'b Interner) -> Self {
        Self {
            unit,
            names,
            interner,
        }
    }

    /// Path of the unit.
    pub fn path(&self) -> &'b Path {
        &self.unit.path
    }

    /// The parsed module.
    pub fn module(&self) -> &'b ParsedModule {
        &self.unit.module
    }

    /// Returns `true` if the unit is an entry point of the bundle.
    pub fn is_entry(&self) -> bool {
        self.unit.is_entry
    }

    /// Returns `true` if declaration `decl` is live and must be emitted.
    pub fn is_live(&self, decl: usize) -> bool {
        self.unit.is_live(decl)
    }

    /// Final name of declaration `decl`, if it is live.
    pub fn decl_name(&self, decl: usize) -> Option<&'b str> {
        self.names.decl(DeclId::new(self.unit.id, decl))
    }

    /// Final name of whatever the local identifier `local` is bound to in
    /// this unit: a declaration, an imported declaration or a namespace.
    pub fn binding_name(&self, local: Ident) -> Option<&'b str> {
        self.names.binding(self.unit.binding(local)?)
    }

    /// Final name of what the `index`th reference of declaration `decl`
    /// resolved to. Member references through a namespace import name the
    /// member itself.
    pub fn reference_name(&self, decl: usize, index: usize) -> Option<&'b str> {
        let binding = *self.unit.references(decl).get(index)?;
        self.names.binding(binding)
    }

    /// Final name of what the `index`th top-level effect reference resolved to.
    pub fn effect_name(&self, index: usize) -> Option<&'b str> {
        let binding = *self.unit.effect_refs.get(index)?;
        self.names.binding(binding)
    }

    /// Final name of this unit's own namespace object, if anything uses it.
    pub fn namespace_name(&self) -> Option<&'b str> {
        self.names.namespace(self.unit.id)
    }

    /// Members of this unit's namespace object as `(exported name, final
    /// name)` pairs in exported-name order. Empty unless the namespace object
    /// is used.
    pub fn namespace_members(&self) -> Vec<(&'b str, &'b str)> {
        if !self.unit.namespace_used() {
            return Vec::new();
        }
        let Some(members) = self.unit.namespace.get() else {
            return Vec::new();
        };
        let mut out: Vec<_> = members
            .iter()
            .filter_map(|(name, binding)| {
                Some((self.interner.resolve(*name), self.names.binding(*binding)?))
            })
            .collect();
        out.sort_unstable();
        out
    }

    /// Type computed for declaration `decl`.
    pub fn decl_type(&self, decl: usize) -> Option<&'b TypeTag> {
        self.unit.decl_type(decl)
    }

    /// Resolves an interned identifier to its source spelling.
    pub fn resolve(&self, ident: Ident) -> &'b str {
        self.interner.resolve(ident)
    }
}
