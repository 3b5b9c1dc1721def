//! Groups an operation's parameters by request channel.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use designfirst_spec_parser::{DefinitionDocument, Operation, ParameterLocation};

use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::rule::{RouteValidation, ValidationRule};
use crate::schema::{compile_properties, compile_schema};

/// Payload channel under construction.
enum Payload {
    /// Keyed entries from formData parameters and object body properties.
    Keys(BTreeMap<String, ValidationRule>),
    /// A single rule for the whole body (array or scalar body schema).
    Whole(ValidationRule),
}

/// Compile the per-channel validation of one operation.
///
/// Media types come from the operation, falling back to the document
/// defaults. Returns `Ok(None)` when the operation declares neither
/// parameters nor media types.
pub fn map_validations(
    document: &DefinitionDocument,
    operation: &Operation,
    location: &str,
    options: &CompileOptions,
) -> Result<Option<RouteValidation>, CompileError> {
    let consumes = operation.consumes.as_deref().unwrap_or(&document.consumes);
    let produces = operation.produces.as_deref().unwrap_or(&document.produces);

    if operation.parameters.is_empty() && consumes.is_empty() && produces.is_empty() {
        return Ok(None);
    }

    let mut headers = BTreeMap::new();
    let mut params = BTreeMap::new();
    let mut query = BTreeMap::new();
    let mut payload = Payload::Keys(BTreeMap::new());

    if !consumes.is_empty() {
        headers.insert("content-type".to_string(), media_type_rule(consumes));
    }
    if !produces.is_empty() {
        headers.insert("accept".to_string(), media_type_rule(produces));
    }

    for param in &operation.parameters {
        let param_location = format!("{} parameter '{}'", location, param.name);
        let schema = param.schema.as_ref();

        match param.location {
            ParameterLocation::Query => {
                if let Some(rule) = compile_schema(schema, param.required, &param_location, options)? {
                    query.insert(param.name.clone(), rule);
                }
            }
            ParameterLocation::Path => {
                if let Some(rule) = compile_schema(schema, param.required, &param_location, options)? {
                    params.insert(param.name.clone(), rule);
                }
            }
            ParameterLocation::Header => {
                if let Some(rule) = compile_schema(schema, param.required, &param_location, options)? {
                    headers.insert(param.name.to_lowercase(), rule);
                }
            }
            ParameterLocation::FormData => {
                let Some(rule) = compile_schema(schema, param.required, &param_location, options)?
                else {
                    continue;
                };
                match &mut payload {
                    Payload::Keys(keys) => {
                        keys.insert(param.name.clone(), rule);
                    }
                    Payload::Whole(_) => {
                        warn!(
                            location = %param_location,
                            "formData parameter ignored, body schema already describes the payload"
                        );
                    }
                }
            }
            ParameterLocation::Body => {
                let Some(schema) = schema else {
                    continue;
                };
                if schema.schema_type.as_deref() == Some("object") {
                    let properties = compile_properties(schema, &param_location, options)?;
                    if let Payload::Keys(keys) = &mut payload {
                        keys.extend(properties);
                    } else {
                        payload = Payload::Keys(properties);
                    }
                } else if let Some(rule) = compile_schema(Some(schema), false, &param_location, options)? {
                    if matches!(&payload, Payload::Keys(keys) if !keys.is_empty()) {
                        warn!(
                            location = %param_location,
                            "body schema replaces previously declared payload keys"
                        );
                    }
                    payload = Payload::Whole(rule);
                }
            }
        }
    }

    Ok(Some(RouteValidation {
        headers: finish_channel(headers).allow_unknown(),
        params: finish_channel(params),
        query: finish_channel(query),
        payload: match payload {
            Payload::Keys(keys) => finish_channel(keys),
            Payload::Whole(rule) => rule,
        },
    }))
}

/// Required string restricted to the declared media types.
fn media_type_rule(media_types: &[String]) -> ValidationRule {
    ValidationRule::string()
        .valid(media_types.iter().cloned().map(Value::String).collect())
        .required()
}

/// A channel with entries becomes an object rule over them; an empty one
/// becomes the permissive open object.
fn finish_channel(keys: BTreeMap<String, ValidationRule>) -> ValidationRule {
    if keys.is_empty() {
        ValidationRule::open_object()
    } else {
        ValidationRule::object(keys)
    }
}
