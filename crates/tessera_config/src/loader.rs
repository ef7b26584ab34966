//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{ProjectConfig, TargetConfig, TargetKind};
use std::path::Path;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = "tessera.toml";

/// Loads and validates a `tessera.toml` configuration from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `tessera.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig = toml::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates required fields and the consistency of every target.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.version.is_empty() {
        return Err(ConfigError::MissingField("project.version".to_string()));
    }
    if let Some(density) = config.build.pixel_density {
        if !(density.is_finite() && density > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "build.pixel_density must be a positive number, got {density}"
            )));
        }
    }
    for name in config.defines.keys() {
        if !is_identifier(name) {
            return Err(ConfigError::Invalid(format!(
                "invalid define name `{name}`"
            )));
        }
    }
    for (name, target) in &config.targets {
        validate_target(name, target)?;
    }
    Ok(())
}

fn validate_target(name: &str, target: &TargetConfig) -> Result<(), ConfigError> {
    if target.output.is_empty() {
        return Err(ConfigError::MissingField(format!("targets.{name}.output")));
    }
    match target.kind {
        TargetKind::View => {
            if target.views.is_empty() {
                return Err(ConfigError::MissingField(format!("targets.{name}.views")));
            }
            if !target.entries.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "view target `{name}` lists entries; use [[targets.{name}.views]] instead"
                )));
            }
            for (i, view) in target.views.iter().enumerate() {
                if view.source.is_empty() || view.output.is_empty() {
                    return Err(ConfigError::MissingField(format!(
                        "targets.{name}.views[{i}].source/output"
                    )));
                }
            }
        }
        TargetKind::Script | TargetKind::Stylesheet | TargetKind::Shader => {
            if target.entries.is_empty() {
                return Err(ConfigError::MissingField(format!("targets.{name}.entries")));
            }
            if !target.views.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "only view targets may declare views (target `{name}`)"
                )));
            }
        }
    }
    Ok(())
}

/// Returns `true` if `s` is a plain identifier (`[A-Za-z_][A-Za-z0-9_]*`).
fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
