use std::path::PathBuf;

use designfirst_spec_parser::ParseError;
use thiserror::Error;

/// Errors produced during compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Definition parsing failed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// E1020: Operation has no operationId, so no handler can be derived.
    #[error("E1020: operation has no operationId: {0}")]
    MissingOperationId(String),

    /// E1051: Schema nesting exceeds the configured depth.
    #[error("E1051: schema too deep: {0}")]
    SchemaTooDeep(String),

    /// One or more definition files failed to load; nothing was compiled.
    #[error("{}", describe_failures(.0))]
    InvalidDefinitions(Vec<DefinitionFailure>),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A definition file that could not be loaded.
#[derive(Debug)]
pub struct DefinitionFailure {
    pub path: PathBuf,
    pub error: ParseError,
}

fn describe_failures(failures: &[DefinitionFailure]) -> String {
    let mut message = format!("{} definition(s) failed validation", failures.len());
    for failure in failures {
        message.push_str(&format!("\n  {}: {}", failure.path.display(), failure.error));
    }
    message
}
