use serde::{Deserialize, Serialize};

/// Options for compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Maximum schema nesting depth (default: 32).
    ///
    /// Deeper schemas fail with E1051 instead of recursing further.
    pub max_schema_depth: usize,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            max_schema_depth: 32,
        }
    }
}
