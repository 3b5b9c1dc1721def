//! Compilation across several definition documents.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use designfirst_spec_parser::{parse_definition_file, DefinitionDocument};

use crate::error::{CompileError, DefinitionFailure};
use crate::options::CompileOptions;
use crate::policy::PolicyTable;
use crate::routes::{assemble_routes, RouteDescriptor};

/// Routes and policies compiled from a set of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CompiledApi {
    pub routes: Vec<RouteDescriptor>,
    pub policies: PolicyTable,
}

impl CompiledApi {
    /// Append another result. Routes are concatenated without
    /// de-duplication and policy lists accumulate.
    pub fn merge(&mut self, other: CompiledApi) {
        self.routes.extend(other.routes);
        self.policies.merge(other.policies);
    }
}

/// Compile a single document into fresh collections.
pub fn compile_definition(
    document: &DefinitionDocument,
    options: &CompileOptions,
) -> Result<CompiledApi, CompileError> {
    let mut compiled = CompiledApi::default();
    assemble_routes(document, options, &mut compiled.routes, &mut compiled.policies)?;

    info!(
        definition = document.filename.as_deref().unwrap_or("<inline>"),
        title = %document.title,
        routes = compiled.routes.len(),
        policies = compiled.policies.len(),
        "definition compiled"
    );

    Ok(compiled)
}

/// Compile documents and merge the results in input order.
///
/// Each document is compiled on its own, so a failure in any of them
/// leaves no partial output.
pub fn compile_definitions(
    documents: &[DefinitionDocument],
    options: &CompileOptions,
) -> Result<CompiledApi, CompileError> {
    let mut merged = CompiledApi::default();
    for document in documents {
        merged.merge(compile_definition(document, options)?);
    }
    Ok(merged)
}

/// Parse every file, collecting all failures before giving up.
pub fn load_definitions(paths: &[&Path]) -> Result<Vec<DefinitionDocument>, CompileError> {
    let mut documents = Vec::with_capacity(paths.len());
    let mut failures = Vec::new();

    for path in paths {
        match parse_definition_file(path) {
            Ok(document) => documents.push(document),
            Err(error) => failures.push(DefinitionFailure {
                path: path.to_path_buf(),
                error,
            }),
        }
    }

    if failures.is_empty() {
        Ok(documents)
    } else {
        Err(CompileError::InvalidDefinitions(failures))
    }
}

/// Load and compile definition files. Nothing is compiled unless every
/// file parses.
pub fn compile_files(
    paths: &[&Path],
    options: &CompileOptions,
) -> Result<CompiledApi, CompileError> {
    let documents = load_definitions(paths)?;
    compile_definitions(&documents, options)
}
