//! Opaque ID newtypes for units and declarations within a bundle.

use std::fmt;

/// Position of a compilation unit in the bundle's final unit order.
///
/// Assigned once dependency resolution has ordered the units, so a smaller
/// ID always denotes a unit that appears earlier in the output.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates an ID from a raw `u32` index.
    pub fn from_raw(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw `u32` index.
    pub fn as_raw(self) -> u32 {
        self.0
    }

    /// Returns the index as a `usize` for slice access.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unit#{}", self.0)
    }
}

/// A top-level declaration: the owning unit plus its position in the
/// unit's declaration list.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct DeclId {
    /// The unit declaring it.
    pub unit: UnitId,
    /// Index into [`ParsedModule::declarations`](crate::ParsedModule::declarations).
    pub index: u32,
}

impl DeclId {
    /// Creates a declaration ID.
    pub fn new(unit: UnitId, index: usize) -> Self {
        Self {
            unit,
            index: index as u32,
        }
    }
}

/// What a name resolves to.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Binding {
    /// A top-level declaration.
    Decl(DeclId),
    /// The namespace object of a unit: its exports plus aggregate re-exports.
    Namespace(UnitId),
}
