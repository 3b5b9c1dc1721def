//! Static routes exposing the definition files and the documentation UI.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where the raw definitions and the UI are served.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpositionConfig {
    /// HTTP path serving the directories holding the definition files.
    pub definition_http_path: String,
    /// HTTP path serving the UI bundle.
    pub ui_http_path: String,
    /// Directory of the UI bundle. Without it no UI route is produced.
    pub ui_dir: Option<PathBuf>,
}

impl Default for ExpositionConfig {
    fn default() -> Self {
        Self {
            definition_http_path: "/swagger".to_string(),
            ui_http_path: "/swagger-ui".to_string(),
            ui_dir: None,
        }
    }
}

/// A `GET` route answered from static directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StaticRoute {
    pub method: String,
    pub path: String,
    pub directories: Vec<PathBuf>,
}

/// Build the exposition routes for a set of definition files.
///
/// Directories are listed once each, in the order their first definition
/// appears. A bare file name maps to `.`.
pub fn exposition_routes(config: &ExpositionConfig, definition_paths: &[PathBuf]) -> Vec<StaticRoute> {
    let mut directories: Vec<PathBuf> = Vec::new();
    for path in definition_paths {
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => Path::new(".").to_path_buf(),
        };
        if !directories.contains(&directory) {
            directories.push(directory);
        }
    }

    let mut routes = Vec::with_capacity(2);
    if !directories.is_empty() {
        routes.push(StaticRoute {
            method: "GET".to_string(),
            path: config.definition_http_path.clone(),
            directories,
        });
    }
    if let Some(ui_dir) = &config.ui_dir {
        routes.push(StaticRoute {
            method: "GET".to_string(),
            path: config.ui_http_path.clone(),
            directories: vec![ui_dir.clone()],
        });
    }
    routes
}
