//! The front-end-neutral view of one parsed source file.
//!
//! A front end reduces its syntax tree to a [`ParsedModule`]: what the file
//! declares at top level, what it imports and exports, and which names each
//! declaration and top-level statement refers to. That is all the bundle
//! pipeline needs to order, link, prune and rename units.

use std::path::PathBuf;

use tessera_common::Ident;

/// Visibility of a top-level declaration beyond its bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Linkage {
    /// Visible only through imports; renamed freely.
    #[default]
    Internal,
    /// Visible across independently built bundles. Gets a stable name
    /// derived from its path and source name, and is always live.
    Universal,
}

/// A free identifier used by a declaration or top-level statement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reference {
    /// A plain identifier.
    Name(Ident),
    /// A member access `object.member`. Resolved through the namespace
    /// object when `object` is a namespace import.
    Member {
        /// The object identifier.
        object: Ident,
        /// The accessed member.
        member: Ident,
    },
}

/// A top-level declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Declaration {
    /// Source name.
    pub name: Ident,
    /// Linkage.
    pub linkage: Linkage,
    /// Free identifiers used by the declaration's body, in source order.
    pub references: Vec<Reference>,
}

/// What an import binds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImportItem {
    /// One exported name.
    Named(Ident),
    /// The exporter's whole namespace object.
    Namespace,
}

/// An import statement binding one local name.
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    /// Local name introduced by the import.
    pub local: Ident,
    /// Path of the exporting unit.
    pub source: PathBuf,
    /// What is imported.
    pub item: ImportItem,
}

/// An export statement.
#[derive(Clone, Debug, PartialEq)]
pub enum Export {
    /// Exports a local binding, a declaration or an import, under `name`.
    Local {
        /// Exported name.
        name: Ident,
        /// Local binding being exported.
        local: Ident,
    },
    /// Re-exports everything `source` exports.
    All {
        /// Path of the re-exported unit.
        source: PathBuf,
    },
}

/// A parsed source file, as seen by the bundle pipeline.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedModule {
    /// Paths this file depends on beyond its imports and re-exports
    /// (included files, referenced assets).
    pub dependencies: Vec<PathBuf>,
    /// Top-level declarations in source order.
    pub declarations: Vec<Declaration>,
    /// Imports in source order.
    pub imports: Vec<Import>,
    /// Exports in source order.
    pub exports: Vec<Export>,
    /// Free identifiers used by top-level statements that always execute.
    pub effects: Vec<Reference>,
}

impl ParsedModule {
    /// Returns the effective dependency list: raw dependencies, then import
    /// sources, then re-export sources, in first-seen order without
    /// duplicates.
    pub fn effective_dependencies(&self) -> Vec<PathBuf> {
        let reexports = self.exports.iter().filter_map(|e| match e {
            Export::All { source } => Some(source),
            Export::Local { .. } => None,
        });
        let mut seen = std::collections::HashSet::new();
        self.dependencies
            .iter()
            .chain(self.imports.iter().map(|i| &i.source))
            .chain(reexports)
            .filter(|p| seen.insert(p.as_path()))
            .cloned()
            .collect()
    }

    /// Returns the index of the first declaration named `name`.
    pub fn declaration(&self, name: Ident) -> Option<usize> {
        self.declarations.iter().position(|d| d.name == name)
    }
}
