//! Project configuration (`designfirst.yaml`).
//!
//! Lists the definition files to compile and how they are exposed.
//! Relative paths are resolved against the directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use designfirst_compiler::{CompileOptions, ExpositionConfig};

/// Config file name `designfirst compile` looks for in the working
/// directory when given no inputs.
pub const CONFIG_FILE_NAME: &str = "designfirst.yaml";

/// Errors loading a project config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{} lists no definitions", .0.display())]
    NoDefinitions(PathBuf),
}

/// A project config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    /// Definition files, compiled in this order.
    #[serde(default)]
    pub definitions: Vec<PathBuf>,

    #[serde(default)]
    pub exposition: ExpositionConfig,

    #[serde(default)]
    pub compiler: CompileOptions,
}

impl ProjectConfig {
    /// Load a config file and resolve its relative paths.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::parse(&content, path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.resolve_paths(base))
    }

    /// Parse config content without touching relative paths.
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        if config.definitions.is_empty() {
            return Err(ConfigError::NoDefinitions(path.to_path_buf()));
        }
        Ok(config)
    }

    /// Make every relative path relative to `base` instead.
    pub fn resolve_paths(mut self, base: &Path) -> Self {
        for definition in &mut self.definitions {
            *definition = resolve(base, definition);
        }
        if let Some(ui_dir) = &self.exposition.ui_dir {
            self.exposition.ui_dir = Some(resolve(base, ui_dir));
        }
        self
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
