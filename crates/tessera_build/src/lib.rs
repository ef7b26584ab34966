//! Build driver for Tessera projects.
//!
//! Turns a resolved `tessera.toml` target into cache lookups, bundle
//! pipeline runs and atomically written artifacts, and reports which roots
//! were rebuilt.

#![warn(missing_docs)]

pub mod builder;
pub mod error;
pub mod output;
pub mod report;
pub mod target;

use std::path::Path;

pub use builder::Builder;
pub use error::BuildError;
pub use output::write_atomic;
pub use report::BuildReport;
pub use target::{global_keys, load_cache, policy_for};

/// Loads the configuration of the project in `project_dir` and builds the
/// target named `target_name` with `builder`.
pub fn build_project(
    builder: &Builder<'_>,
    project_dir: &Path,
    target_name: &str,
) -> Result<BuildReport, BuildError> {
    let config = tessera_config::load_config(project_dir)?;
    let target = tessera_config::resolve_target(&config, project_dir, target_name)?;
    builder.build(&target)
}
