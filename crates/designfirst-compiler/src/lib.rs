//! Compiles Swagger definitions into routes, validation rules and policies.
//!
//! Takes parsed [`DefinitionDocument`]s and produces, per operation, a
//! route descriptor carrying per-channel validation rules and an ordered
//! policy chain, plus a controller/action policy table accumulated across
//! every compiled document.

pub mod channels;
pub mod error;
pub mod exposition;
pub mod merge;
pub mod options;
pub mod policy;
pub mod routes;
pub mod rule;
pub mod schema;

pub use channels::map_validations;
pub use error::{CompileError, DefinitionFailure};
pub use exposition::{exposition_routes, ExpositionConfig, StaticRoute};
pub use merge::{compile_definition, compile_definitions, compile_files, load_definitions, CompiledApi};
pub use options::CompileOptions;
pub use policy::{resolve_policies, split_policies, PolicyTable, ResolvedPolicies};
pub use routes::{assemble_routes, join_path, RouteDescriptor};
pub use rule::{Channel, Constraint, RouteValidation, RuleKind, ValidationRule};
pub use schema::{compile_properties, compile_schema};
// Re-export the document model consumed by the compiler
pub use designfirst_spec_parser::DefinitionDocument;
