//! Final identifier assignment.
//!
//! Universal declarations get names derived from their path and source name,
//! identical in every build. Every other live declaration, and every used
//! namespace object, gets a name from a single bundle-wide [`Namespace`].

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use tessera_common::{ContentHash, Interner};

use crate::error::BundleError;
use crate::ids::{Binding, DeclId, UnitId};
use crate::module::Linkage;
use crate::unit::CompilationUnit;

/// Short-name alphabet used in compact mode.
const SHORT_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Hex digits of the path/name hash kept in a universal name.
const UNIVERSAL_HASH_LEN: usize = 12;

/// Allocator handing out identifiers unique within one bundle.
#[derive(Debug, Default)]
pub struct Namespace {
    taken: HashSet<String>,
    next_suffix: HashMap<String, u32>,
    next_short: usize,
    compact: bool,
}

impl Namespace {
    /// Creates an empty allocator. In compact mode names come from the
    /// short-name sequence instead of source spellings.
    pub fn new(compact: bool) -> Self {
        Self {
            compact,
            ..Self::default()
        }
    }

    /// Marks `name` as unavailable. Returns `false` if it already was.
    pub fn reserve(&mut self, name: &str) -> bool {
        self.taken.insert(name.to_string())
    }

    /// Returns `true` if `name` is unavailable.
    pub fn is_taken(&self, name: &str) -> bool {
        self.taken.contains(name)
    }

    /// Allocates a fresh name for an identifier spelled `base` in source.
    ///
    /// Readable mode keeps `base` when free, else appends the smallest free
    /// suffix `$1`, `$2`, .... Compact mode ignores `base`.
    pub fn allocate(&mut self, base: &str) -> String {
        let name = if self.compact {
            loop {
                let candidate = short_name(self.next_short);
                self.next_short += 1;
                if !self.is_taken(&candidate) {
                    break candidate;
                }
            }
        } else if !self.is_taken(base) {
            base.to_string()
        } else {
            let next = self.next_suffix.entry(base.to_string()).or_insert(1);
            loop {
                let candidate = format!("{base}${next}");
                *next += 1;
                if !self.taken.contains(&candidate) {
                    break candidate;
                }
            }
        };
        self.taken.insert(name.clone());
        name
    }
}

/// Returns the `n`th name of the sequence `a`..`z`, `A`..`Z`, `aa`, `ab`, ....
pub fn short_name(mut n: usize) -> String {
    let base = SHORT_ALPHABET.len();
    let mut out = Vec::new();
    loop {
        out.push(SHORT_ALPHABET[n % base]);
        if n < base {
            break;
        }
        n = n / base - 1;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Stable name of universal declaration `name` defined in `path`.
pub fn universal_name(path: &Path, name: &str) -> String {
    let path = path.to_string_lossy();
    let hash = ContentHash::from_parts(&[path.as_bytes(), name.as_bytes()]);
    format!("{}_{}", name, hash.short(UNIVERSAL_HASH_LEN))
}

/// Final names of a finalized bundle.
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    decls: HashMap<DeclId, String>,
    namespaces: HashMap<UnitId, String>,
}

impl NameTable {
    /// Final name of a declaration.
    pub fn decl(&self, id: DeclId) -> Option<&str> {
        self.decls.get(&id).map(String::as_str)
    }

    /// Final name of a unit's namespace object.
    pub fn namespace(&self, unit: UnitId) -> Option<&str> {
        self.namespaces.get(&unit).map(String::as_str)
    }

    /// Final name of whatever `binding` refers to.
    pub fn binding(&self, binding: Binding) -> Option<&str> {
        match binding {
            Binding::Decl(id) => self.decl(id),
            Binding::Namespace(unit) => self.namespace(unit),
        }
    }

    /// Every final name handed out.
    pub fn used_names(&self) -> BTreeSet<String> {
        self.decls
            .values()
            .chain(self.namespaces.values())
            .cloned()
            .collect()
    }

    /// Number of named declarations and namespace objects.
    pub fn len(&self) -> usize {
        self.decls.len() + self.namespaces.len()
    }

    /// Returns `true` if nothing was named.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Assigns final names to every live declaration and used namespace object.
///
/// `reserved` holds names never handed out: front-end reserved words and
/// global constant names. Iteration is in unit order then declaration order,
/// so unchanged input yields the same assignment.
pub(crate) fn assign_names<'r>(
    units: &[CompilationUnit],
    interner: &Interner,
    reserved: impl IntoIterator<Item = &'r str>,
    compact: bool,
) -> Result<NameTable, BundleError> {
    let mut table = NameTable::default();
    let mut namespace = Namespace::new(compact);
    for word in reserved {
        namespace.reserve(word);
    }

    let mut universal: HashMap<String, DeclId> = HashMap::new();
    for unit in units {
        for (d, decl) in unit.module.declarations.iter().enumerate() {
            if decl.linkage != Linkage::Universal {
                continue;
            }
            let id = DeclId::new(unit.id, d);
            let name = universal_name(&unit.path, interner.resolve(decl.name));
            if let Some(&first) = universal.get(&name) {
                return Err(BundleError::NameCollision {
                    name,
                    first: describe(units, interner, first),
                    second: describe(units, interner, id),
                });
            }
            namespace.reserve(&name);
            universal.insert(name.clone(), id);
            table.decls.insert(id, name);
        }
    }

    for unit in units {
        for (d, decl) in unit.module.declarations.iter().enumerate() {
            if decl.linkage == Linkage::Universal || !unit.is_live(d) {
                continue;
            }
            let name = namespace.allocate(interner.resolve(decl.name));
            table.decls.insert(DeclId::new(unit.id, d), name);
        }
        if unit.namespace_used() {
            let name = namespace.allocate(&namespace_base(&unit.path));
            table.namespaces.insert(unit.id, name);
        }
    }
    Ok(table)
}

/// Source-like spelling for a namespace object: the file stem with every
/// non-identifier character replaced by `_`.
fn namespace_base(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut base: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if base.is_empty() || base.starts_with(|c: char| c.is_ascii_digit()) {
        base.insert(0, '_');
    }
    base
}

fn describe(units: &[CompilationUnit], interner: &Interner, id: DeclId) -> String {
    let unit = &units[id.unit.index()];
    let name = interner.resolve(unit.module.declarations[id.index as usize].name);
    format!("{}#{}", unit.path.display(), name)
}
