//! File-backed front end and project fixture shared by the integration tests.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime};

use tessera_build::{build_project, BuildError, BuildReport, Builder};
use tessera_bundle::{
    Declaration, Export, Frontend, Import, ImportItem, Linkage, ParseError, ParsedModule, Reference,
    UnitView,
};
use tessera_common::Interner;

pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Front end for a line-based toy language. Paths are relative to the
/// directory of the file naming them.
///
/// ```text
/// dep <file>
/// import <local> <file> <name>
/// decl <name> <ref>...
/// export <name>
/// effect <ref>
/// error <message>
/// ```
#[derive(Default)]
pub struct LineFrontend {
    parses: AtomicUsize,
}

impl LineFrontend {
    pub fn parse_count(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl Frontend for LineFrontend {
    fn parse(&self, path: &Path, interner: &Interner) -> Result<ParsedModule, ParseError> {
        let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => ParseError::NotFound {
                path: path.to_path_buf(),
            },
            _ => ParseError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;
        self.parses.fetch_add(1, Ordering::SeqCst);

        let dir = path.parent().unwrap_or(Path::new("/"));
        let mut module = ParsedModule::default();
        for line in text.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            match words.as_slice() {
                [] => {}
                ["dep", file] => module.dependencies.push(dir.join(file)),
                ["import", local, file, name] => module.imports.push(Import {
                    local: interner.get_or_intern(local),
                    source: dir.join(file),
                    item: ImportItem::Named(interner.get_or_intern(name)),
                }),
                ["decl", name, refs @ ..] => module.declarations.push(Declaration {
                    name: interner.get_or_intern(name),
                    linkage: Linkage::Internal,
                    references: refs
                        .iter()
                        .map(|r| Reference::Name(interner.get_or_intern(r)))
                        .collect(),
                }),
                ["export", name] => module.exports.push(Export::Local {
                    name: interner.get_or_intern(name),
                    local: interner.get_or_intern(name),
                }),
                ["effect", name] => module.effects.push(Reference::Name(interner.get_or_intern(name))),
                ["error", message @ ..] => {
                    return Err(ParseError::Syntax {
                        path: path.to_path_buf(),
                        message: message.join(" "),
                    })
                }
                other => {
                    return Err(ParseError::Syntax {
                        path: path.to_path_buf(),
                        message: format!("unknown statement {other:?}"),
                    })
                }
            }
        }
        Ok(module)
    }

    fn emit(&self, unit: &UnitView<'_>, out: &mut Vec<u8>) -> Result<(), String> {
        let module = unit.module();
        for (d, decl) in module.declarations.iter().enumerate() {
            let Some(name) = unit.decl_name(d) else {
                continue;
            };
            let refs: Vec<&str> = (0..decl.references.len())
                .map(|i| unit.reference_name(d, i).unwrap_or("?"))
                .collect();
            out.extend_from_slice(format!("{name} = [{}];\n", refs.join(", ")).as_bytes());
        }
        for i in 0..module.effects.len() {
            let name = unit.effect_name(i).unwrap_or("?");
            out.extend_from_slice(format!("effect({name});\n").as_bytes());
        }
        Ok(())
    }

    fn emit_define(&self, name: &str, value: &str, out: &mut Vec<u8>) {
        out.extend_from_slice(format!("const {name} = {value};\n").as_bytes());
    }
}

/// A project directory with a `tessera.toml`.
pub struct Project {
    dir: tempfile::TempDir,
    pub frontend: LineFrontend,
    pub interner: Interner,
}

impl Project {
    pub fn new(config: &str) -> Self {
        init_logging();
        let project = Self {
            dir: tempfile::tempdir().unwrap(),
            frontend: LineFrontend::default(),
            interner: Interner::new(),
        };
        project.write("tessera.toml", config);
        project
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Writes a file, dated in the past so builds in the same second see it
    /// as older than themselves.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, content).unwrap();
        self.age(rel, -60);
        path
    }

    /// Rewrites a file and dates it after every build so far.
    pub fn modify(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.path(rel);
        std::fs::write(&path, content).unwrap();
        self.age(rel, 60);
        path
    }

    /// Sets a file's modification time `offset_secs` from now.
    pub fn age(&self, rel: &str, offset_secs: i64) {
        let now = SystemTime::now();
        let delta = Duration::from_secs(offset_secs.unsigned_abs());
        let time = if offset_secs < 0 { now - delta } else { now + delta };
        File::options()
            .write(true)
            .open(self.path(rel))
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn build(&self, target: &str) -> Result<BuildReport, BuildError> {
        let builder = Builder::new(&self.frontend, &self.interner);
        build_project(&builder, self.dir.path(), target)
    }

    pub fn builder(&self) -> Builder<'_> {
        Builder::new(&self.frontend, &self.interner)
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }
}
