//! Swagger 2.0 definition parser.
//!
//! Reads YAML/JSON definition documents, inlines local `$ref`s and extracts
//! paths, operations, parameters, security requirements and the
//! `x-swagger-router-*` vendor extensions consumed by the compiler.

pub mod error;
pub mod model;
pub mod parser;

pub use error::ParseError;
pub use model::{
    DefinitionDocument, Operation, ParameterDescriptor, ParameterLocation, PathItem,
    SchemaNode, SchemeReference, SecurityRequirement, SecurityScheme,
};
pub use parser::{parse_definition, parse_definition_file, CONTROLLER_EXTENSION, POLICY_EXTENSION};
