//! Configuration types deserialized from `tessera.toml`.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Default cache directory, relative to the project root.
pub const DEFAULT_CACHE_DIR: &str = ".tessera-cache";

/// The top-level project configuration parsed from `tessera.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata (name, version).
    pub project: ProjectMeta,
    /// Global build parameters shared by every target.
    #[serde(default)]
    pub build: BuildConfig,
    /// Global constant definitions injected into every artifact.
    #[serde(default)]
    pub defines: BTreeMap<String, String>,
    /// Named build targets (e.g., "app", "styles", "views").
    #[serde(default)]
    pub targets: BTreeMap<String, TargetConfig>,
}

/// Core project metadata required in every `tessera.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string. Doubles as the build/version marker that
    /// invalidates every cache when it changes.
    pub version: String,
    /// A brief description of the project.
    #[serde(default)]
    pub description: String,
}

/// Global build parameters.
///
/// Every field here is a global invalidation key for at least one cache
/// variant: changing it discards the persisted cache of the affected targets.
#[derive(Debug, Clone, Deserialize)]
pub struct BuildConfig {
    /// Emit compact output (short mangled names, no readable spelling).
    #[serde(default)]
    pub compact: bool,
    /// Externally supplied commit tag baked into script artifacts.
    #[serde(default)]
    pub commit: Option<String>,
    /// Pixel density setting for view and stylesheet assets.
    #[serde(default)]
    pub pixel_density: Option<f64>,
    /// External stylesheet URLs referenced by views.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub css_urls: Vec<String>,
    /// External script URLs referenced by views.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub js_urls: Vec<String>,
    /// Cache directory, relative to the project root.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,
    /// Ignore persisted caches and rebuild everything.
    #[serde(default)]
    pub force: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            compact: false,
            commit: None,
            pixel_density: None,
            css_urls: Vec::new(),
            js_urls: Vec::new(),
            cache_dir: default_cache_dir(),
            force: false,
        }
    }
}

fn default_cache_dir() -> String {
    DEFAULT_CACHE_DIR.to_string()
}

/// The language front end a target is compiled with.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// Typed script sources bundled into one artifact.
    Script,
    /// Stylesheet sources bundled into one artifact.
    Stylesheet,
    /// Template views, each compiled to its own artifact next to a
    /// controlling script.
    View,
    /// Shader sources bundled into one artifact.
    Shader,
}

/// Configuration for one build target.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Front end used for this target.
    pub kind: TargetKind,
    /// Output artifact path (or output directory for view targets).
    /// Also the identity of the target's cache.
    pub output: String,
    /// Entry source files, for bundled targets.
    #[serde(default, deserialize_with = "deserialize_string_or_vec")]
    pub entries: Vec<String>,
    /// Named entry points exposed by a script bundle.
    #[serde(default)]
    pub entry_points: Vec<String>,
    /// Views, for view targets.
    #[serde(default)]
    pub views: Vec<ViewConfig>,
}

/// One template view and its controlling script.
#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    /// The view's template source.
    pub source: String,
    /// The artifact the view compiles to.
    pub output: String,
    /// The script that controls this view, if any.
    #[serde(default)]
    pub controller: Option<String>,
}

/// Deserializes a field that can be either a single string or a list of strings.
///
/// Allows `entries = "src/main.ts"` as well as `entries = ["a.ts", "b.ts"]`.
fn deserialize_string_or_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct StringOrVec;

    impl<'de> Visitor<'de> for StringOrVec {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                vec.push(val);
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(StringOrVec)
}
