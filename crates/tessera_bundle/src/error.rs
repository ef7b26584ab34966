//! Error types for dependency resolution, bundling and front-end collaboration.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// Errors reported by a [`Frontend`](crate::Frontend) while parsing a file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// The file doesn't exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// The file exists but couldn't be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The unreadable path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file has a syntax error.
    #[error("syntax error in {}: {message}", path.display())]
    Syntax {
        /// The offending file.
        path: PathBuf,
        /// Front-end description of the error.
        message: String,
    },
}

/// Errors that abort [`Bundle::finalize`](crate::Bundle::finalize) or
/// [`Bundle::write`](crate::Bundle::write).
#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    /// A referenced file doesn't exist.
    #[error("unresolved dependency {}{}", path.display(), referenced_by_suffix(referenced_by.as_deref()))]
    UnresolvedDependency {
        /// The missing path.
        path: PathBuf,
        /// The unit that referenced it, or `None` for an entry path.
        referenced_by: Option<PathBuf>,
    },

    /// The units form a dependency cycle.
    #[error("circular dependency: {}", format_chain(chain))]
    CircularDependency {
        /// The cycle, starting and ending with the same unit.
        chain: Vec<PathBuf>,
    },

    /// A unit exports the same name twice.
    #[error("duplicate export `{name}` in {}", path.display())]
    DuplicateExport {
        /// The exporting unit.
        path: PathBuf,
        /// The duplicated name.
        name: String,
    },

    /// An import binds a local name that is already bound.
    #[error("duplicate import `{name}` in {}", path.display())]
    DuplicateImport {
        /// The importing unit.
        path: PathBuf,
        /// The duplicated local name.
        name: String,
    },

    /// A name couldn't be resolved.
    #[error("name `{name}` not found in {}{}", path.display(), exporter_suffix(exporter.as_deref()))]
    NameNotFound {
        /// The unit using the name.
        path: PathBuf,
        /// The unresolved name (`ns.member` for member references).
        name: String,
        /// The unit expected to export the name, for imports.
        exporter: Option<PathBuf>,
    },

    /// The front end failed to compute a declaration's type.
    #[error("type error in {} at `{name}`: {message}", path.display())]
    TypeError {
        /// The unit declaring it.
        path: PathBuf,
        /// The declaration name.
        name: String,
        /// Front-end description of the error.
        message: String,
    },

    /// Two distinct universal declarations hashed to the same name.
    #[error("universal name `{name}` assigned to both {first} and {second}")]
    NameCollision {
        /// The colliding name.
        name: String,
        /// First declaration, as `path#name`.
        first: String,
        /// Second declaration, as `path#name`.
        second: String,
    },

    /// The front end failed to parse a file.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// [`Bundle::write`](crate::Bundle::write) was called before a successful
    /// finalize.
    #[error("bundle has not been finalized")]
    NotFinalized,

    /// The front end failed to emit code for a unit.
    #[error("failed to emit {}: {message}", path.display())]
    Emit {
        /// The unit being emitted.
        path: PathBuf,
        /// Front-end description of the error.
        message: String,
    },
}

/// Renders a cycle as `a -> b -> c -> a`.
pub fn format_chain(chain: &[PathBuf]) -> String {
    let mut out = String::new();
    for (i, path) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" -> ");
        }
        let _ = write!(out, "{}", path.display());
    }
    out
}

fn referenced_by_suffix(referenced_by: Option<&Path>) -> String {
    referenced_by
        .map(|p| format!(" (referenced by {})", p.display()))
        .unwrap_or_default()
}

fn exporter_suffix(exporter: Option<&Path>) -> String {
    exporter
        .map(|p| format!(" (imported from {})", p.display()))
        .unwrap_or_default()
}
