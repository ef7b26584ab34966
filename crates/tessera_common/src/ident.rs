//! Interned source names.
//!
//! Front ends intern every declaration, import and export name while parsing.
//! Parsed modules outlive a single build when they sit in the parse cache, so
//! the interner is created once per process and shared with every bundle.

use lasso::ThreadedRodeo;

/// An interned declaration, import or export name.
///
/// Equal spellings from one [`Interner`] give equal `Ident`s. The ordering
/// follows interning order, which depends on parse order; sort by spelling
/// wherever generated output depends on the order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Ident(u32);

// SAFETY: `into_usize` widens a `u32`, and `try_from_usize` only accepts
// values that round-trip through `u32`.
unsafe impl lasso::Key for Ident {
    fn into_usize(self) -> usize {
        self.0 as usize
    }

    fn try_from_usize(int: usize) -> Option<Self> {
        u32::try_from(int).ok().map(Ident)
    }
}

/// Process-wide name table, safe to share between parsing threads.
pub struct Interner {
    rodeo: ThreadedRodeo<Ident>,
}

impl Interner {
    /// Creates an empty interner.
    pub fn new() -> Self {
        Self {
            rodeo: ThreadedRodeo::new(),
        }
    }

    /// Returns the `Ident` for `name`, interning it on first use.
    pub fn get_or_intern(&self, name: &str) -> Ident {
        self.rodeo.get_or_intern(name)
    }

    /// Returns the `Ident` for `name` without interning it.
    pub fn get(&self, name: &str) -> Option<Ident> {
        self.rodeo.get(name)
    }

    /// Returns the source spelling of `ident`.
    ///
    /// # Panics
    ///
    /// Panics if `ident` came from another interner.
    pub fn resolve(&self, ident: Ident) -> &str {
        self.rodeo.resolve(&ident)
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
