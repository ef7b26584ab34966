//! Target resolution: merging global settings into one target with absolute paths.

use crate::error::ConfigError;
use crate::types::{BuildConfig, ProjectConfig, TargetKind};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

/// One root of a resolved target: a source compiled on its own or as part of
/// the target bundle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRoot {
    /// Absolute path of the root source.
    pub source: PathBuf,
    /// Absolute path of the root's own artifact (view targets only).
    pub output: Option<PathBuf>,
    /// Absolute path of the controlling script (view targets only).
    pub controller: Option<PathBuf>,
}

/// A fully resolved target with global settings merged and every path made
/// absolute against the project directory.
#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    /// The target name.
    pub name: String,
    /// Front end used for this target.
    pub kind: TargetKind,
    /// Absolute artifact path (output directory for view targets).
    pub output: PathBuf,
    /// Roots in declaration order.
    pub roots: Vec<ResolvedRoot>,
    /// Named entry points exposed by the target.
    pub entry_points: Vec<String>,
    /// Global build parameters.
    pub build: BuildConfig,
    /// Absolute cache directory.
    pub cache_dir: PathBuf,
    /// Global constant definitions.
    pub defines: BTreeMap<String, String>,
    /// Build/version marker (the project version).
    pub version: String,
}

impl ResolvedTarget {
    /// Returns `true` if every root compiles into the single target artifact,
    /// as opposed to one artifact per root.
    pub fn is_bundled(&self) -> bool {
        self.kind != TargetKind::View
    }
}

/// Resolves a named target against `project_dir`.
pub fn resolve_target(
    config: &ProjectConfig,
    project_dir: &Path,
    target_name: &str,
) -> Result<ResolvedTarget, ConfigError> {
    let target = config
        .targets
        .get(target_name)
        .ok_or_else(|| ConfigError::UnknownTarget {
            name: target_name.to_string(),
            configured: config.targets.keys().cloned().collect::<Vec<_>>().join(", "),
        })?;

    let roots = match target.kind {
        TargetKind::View => target
            .views
            .iter()
            .map(|view| ResolvedRoot {
                source: absolutize(project_dir, &view.source),
                output: Some(absolutize(project_dir, &view.output)),
                controller: view
                    .controller
                    .as_deref()
                    .map(|c| absolutize(project_dir, c)),
            })
            .collect(),
        TargetKind::Script | TargetKind::Stylesheet | TargetKind::Shader => target
            .entries
            .iter()
            .map(|entry| ResolvedRoot {
                source: absolutize(project_dir, entry),
                output: None,
                controller: None,
            })
            .collect(),
    };

    Ok(ResolvedTarget {
        name: target_name.to_string(),
        kind: target.kind,
        output: absolutize(project_dir, &target.output),
        roots,
        entry_points: target.entry_points.clone(),
        build: config.build.clone(),
        cache_dir: absolutize(project_dir, &config.build.cache_dir),
        defines: config.defines.clone(),
        version: config.project.version.clone(),
    })
}

/// Joins a relative configuration path onto the project directory and
/// normalizes the result, so one file always resolves to one path.
fn absolutize(project_dir: &Path, p: &str) -> PathBuf {
    let path = Path::new(p);
    if path.is_absolute() {
        normalize(path)
    } else {
        normalize(&project_dir.join(path))
    }
}

/// Removes `.` components and folds `..` into the preceding component,
/// without touching the filesystem. `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other),
        }
    }
    out
}
