//! In-memory front end shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tessera_bundle::{
    Declaration, Export, Frontend, Import, ImportItem, Linkage, ParseError, ParsedModule, Reference,
    TypeTag, UnitView,
};
use tessera_common::{Ident, Interner};

/// Installs a test subscriber once per process so `RUST_LOG` shows pipeline
/// logs for failing tests.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// String-level description of a source file.
#[derive(Clone, Debug, Default)]
pub struct Source {
    deps: Vec<PathBuf>,
    decls: Vec<(String, Linkage, Vec<String>)>,
    imports: Vec<(String, PathBuf, Option<String>)>,
    exports: Vec<(Option<(String, String)>, Option<PathBuf>)>,
    effects: Vec<String>,
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a raw dependency (an include or asset).
    pub fn dep(mut self, path: &str) -> Self {
        self.deps.push(PathBuf::from(path));
        self
    }

    /// Declares `name` referring to `refs` (`"x"` or `"ns.member"`).
    pub fn decl(mut self, name: &str, refs: &[&str]) -> Self {
        self.decls.push((name.into(), Linkage::Internal, strings(refs)));
        self
    }

    /// Declares a universal `name`.
    pub fn universal(mut self, name: &str, refs: &[&str]) -> Self {
        self.decls.push((name.into(), Linkage::Universal, strings(refs)));
        self
    }

    /// `import { name as local } from source`.
    pub fn import(mut self, local: &str, source: &str, name: &str) -> Self {
        self.imports.push((local.into(), source.into(), Some(name.into())));
        self
    }

    /// `import * as local from source`.
    pub fn import_all(mut self, local: &str, source: &str) -> Self {
        self.imports.push((local.into(), source.into(), None));
        self
    }

    /// `export { name }`.
    pub fn export(self, name: &str) -> Self {
        self.export_as(name, name)
    }

    /// `export { local as name }`.
    pub fn export_as(mut self, name: &str, local: &str) -> Self {
        self.exports.push((Some((name.into(), local.into())), None));
        self
    }

    /// `export * from source`.
    pub fn reexport_all(mut self, source: &str) -> Self {
        self.exports.push((None, Some(source.into())));
        self
    }

    /// A top-level statement using `refs`.
    pub fn effect(mut self, refs: &[&str]) -> Self {
        self.effects.extend(strings(refs));
        self
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn reference(interner: &Interner, text: &str) -> Reference {
    match text.split_once('.') {
        Some((object, member)) => Reference::Member {
            object: interner.get_or_intern(object),
            member: interner.get_or_intern(member),
        },
        None => Reference::Name(interner.get_or_intern(text)),
    }
}

/// Front end backed by a path → [`Source`] map.
///
/// Emits one line per live declaration, `name = [refs];`, plus
/// `effect(refs);` per effect and `const ns = {..};` per used namespace.
#[derive(Default)]
pub struct MemoryFrontend {
    files: HashMap<PathBuf, Source>,
    syntax_errors: HashSet<PathBuf>,
    type_errors: HashSet<String>,
    failing: Mutex<HashSet<Ident>>,
    parses: AtomicUsize,
}

impl MemoryFrontend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: impl AsRef<Path>, source: Source) -> Self {
        self.files.insert(path.as_ref().to_path_buf(), source);
        self
    }

    pub fn syntax_error(mut self, path: &str) -> Self {
        self.syntax_errors.insert(PathBuf::from(path));
        self
    }

    pub fn type_error(mut self, decl: &str) -> Self {
        self.type_errors.insert(decl.to_string());
        self
    }

    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl Frontend for MemoryFrontend {
    fn parse(&self, path: &Path, interner: &Interner) -> Result<ParsedModule, ParseError> {
        if self.syntax_errors.contains(path) {
            return Err(ParseError::Syntax {
                path: path.to_path_buf(),
                message: "unexpected token".into(),
            });
        }
        let source = self.files.get(path).ok_or_else(|| ParseError::NotFound {
            path: path.to_path_buf(),
        })?;
        self.parses.fetch_add(1, Ordering::SeqCst);

        let declarations = source
            .decls
            .iter()
            .map(|(name, linkage, refs)| {
                let ident = interner.get_or_intern(name);
                if self.type_errors.contains(name) {
                    self.failing.lock().insert(ident);
                }
                Declaration {
                    name: ident,
                    linkage: *linkage,
                    references: refs.iter().map(|r| reference(interner, r)).collect(),
                }
            })
            .collect();
        let imports = source
            .imports
            .iter()
            .map(|(local, from, name)| Import {
                local: interner.get_or_intern(local),
                source: from.clone(),
                item: match name {
                    Some(name) => ImportItem::Named(interner.get_or_intern(name)),
                    None => ImportItem::Namespace,
                },
            })
            .collect();
        let exports = source
            .exports
            .iter()
            .map(|(local, all)| match (local, all) {
                (Some((name, local)), _) => Export::Local {
                    name: interner.get_or_intern(name),
                    local: interner.get_or_intern(local),
                },
                (None, Some(from)) => Export::All { source: from.clone() },
                (None, None) => unreachable!("export without name or source"),
            })
            .collect();

        Ok(ParsedModule {
            dependencies: source.deps.clone(),
            declarations,
            imports,
            exports,
            effects: source.effects.iter().map(|r| reference(interner, r)).collect(),
        })
    }

    fn eval_type(
        &self,
        module: &ParsedModule,
        decl: usize,
        inputs: &[Option<TypeTag>],
    ) -> Result<TypeTag, String> {
        if self.failing.lock().contains(&module.declarations[decl].name) {
            return Err("cannot infer type".into());
        }
        if inputs.is_empty() {
            return Ok(TypeTag("leaf".into()));
        }
        let inner: Vec<String> = inputs
            .iter()
            .map(|t| t.as_ref().map_or("?".to_string(), ToString::to_string))
            .collect();
        Ok(TypeTag(format!("ref({})", inner.join(","))))
    }

    fn emit(&self, unit: &UnitView<'_>, out: &mut Vec<u8>) -> Result<(), String> {
        let module = unit.module();
        for (d, decl) in module.declarations.iter().enumerate() {
            if !unit.is_live(d) {
                continue;
            }
            let name = unit.decl_name(d).ok_or("live declaration without a name")?;
            let refs: Vec<&str> = (0..decl.references.len())
                .map(|i| unit.reference_name(d, i).unwrap_or("?"))
                .collect();
            out.extend_from_slice(format!("{name} = [{}];\n", refs.join(", ")).as_bytes());
        }
        for i in 0..module.effects.len() {
            let name = unit.effect_name(i).unwrap_or("?");
            out.extend_from_slice(format!("effect({name});\n").as_bytes());
        }
        if let Some(ns) = unit.namespace_name() {
            let members: Vec<String> = unit
                .namespace_members()
                .into_iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            out.extend_from_slice(format!("const {ns} = {{{}}};\n", members.join(", ")).as_bytes());
        }
        Ok(())
    }

    fn prelude(&self) -> &str {
        "/* prelude */\n"
    }

    fn reserved_words(&self) -> &[&str] {
        &["class", "return"]
    }

    fn emit_define(&self, name: &str, value: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("const {name} = {value};\n").as_bytes());
    }
}
