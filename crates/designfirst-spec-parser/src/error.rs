use thiserror::Error;

/// Errors produced while parsing a definition document (E1001–E1004).
#[derive(Debug, Error)]
pub enum ParseError {
    /// E1001: Document carries neither a `swagger` nor an `openapi` root field.
    #[error("E1001: not a Swagger 2.0 definition document")]
    UnknownFormat,

    /// E1002: YAML/JSON parse error.
    #[error("E1002: parse error: {0}")]
    ParseError(String),

    /// E1003: Unresolved $ref.
    #[error("E1003: unresolved $ref: {0}")]
    UnresolvedRef(String),

    /// E1004: Structural error in the document.
    #[error("E1004: schema validation error: {0}")]
    SchemaError(String),

    /// I/O error reading the definition file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
