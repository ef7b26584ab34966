//! Dependency resolution and bundling shared by every Tessera front end.
//!
//! A front end implements [`Frontend`] to turn files into [`ParsedModule`]s
//! and to generate code. This crate does the rest: it discovers and orders
//! the units reachable from a set of entry paths ([`Resolver`]), links their
//! imports and exports, evaluates types, prunes dead declarations, assigns
//! unique identifiers, and concatenates the result ([`Bundle`]).

#![warn(missing_docs)]

mod activity;
pub mod bundle;
pub mod error;
pub mod frontend;
pub mod ids;
pub mod module;
mod names;
pub mod naming;
pub mod parse_cache;
pub mod resolver;
mod types;
pub mod unit;

pub use bundle::{Artifact, Bundle, BundleOptions, Phase};
pub use error::{format_chain, BundleError, ParseError};
pub use frontend::{Frontend, TypeTag, UnitView};
pub use ids::{Binding, DeclId, UnitId};
pub use module::{Declaration, Export, Import, ImportItem, Linkage, ParsedModule, Reference};
pub use naming::{NameTable, Namespace};
pub use parse_cache::ParseCache;
pub use resolver::{order_units, Resolver};
pub use unit::CompilationUnit;
