//! Route assembly for one definition document.

use serde::Serialize;
use tracing::debug;

use designfirst_spec_parser::DefinitionDocument;

use crate::channels::map_validations;
use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::policy::{resolve_policies, PolicyTable};
use crate::rule::RouteValidation;

/// One compiled route, ready for a host route registry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteDescriptor {
    /// Upper-case HTTP method.
    pub method: String,
    /// `basePath` joined with the path template.
    pub path: String,
    /// `controller.operationId`, or the bare operation id.
    pub handler: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<RouteValidation>,
    /// Pre-handler policies, in execution order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub policies: Vec<String>,
}

/// Compile every operation of `document` and append the results.
///
/// Routes are appended in path order, then method order within a path.
/// On error nothing is guaranteed about what was already appended; callers
/// that need all-or-nothing behavior compile into fresh collections.
pub fn assemble_routes(
    document: &DefinitionDocument,
    options: &CompileOptions,
    routes: &mut Vec<RouteDescriptor>,
    table: &mut PolicyTable,
) -> Result<(), CompileError> {
    let source = document.filename.as_deref().unwrap_or("<inline>");

    for path_item in &document.paths {
        for operation in &path_item.operations {
            let method = operation.method.to_uppercase();
            let location = format!("{} {} in '{}'", method, path_item.path, source);

            let action = operation
                .operation_id
                .as_deref()
                .ok_or_else(|| CompileError::MissingOperationId(location.clone()))?;

            let validation = map_validations(document, operation, &location, options)?;
            let resolved = resolve_policies(document, path_item, operation, action, table);
            let path = join_path(&document.base_path, &path_item.path);

            debug!(
                method = %method,
                path = %path,
                handler = %resolved.handler,
                policies = resolved.policies.len(),
                "route compiled"
            );

            routes.push(RouteDescriptor {
                method,
                path,
                handler: resolved.handler,
                validation,
                policies: resolved.policies,
            });
        }
    }

    Ok(())
}

/// Prefix a path template with the base path, collapsing a doubled `/`.
pub fn join_path(base_path: &str, template: &str) -> String {
    match base_path.strip_suffix('/') {
        Some(base) if template.starts_with('/') => format!("{}{}", base, template),
        _ => format!("{}{}", base_path, template),
    }
}
