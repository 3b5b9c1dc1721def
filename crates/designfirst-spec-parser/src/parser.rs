use std::collections::{BTreeMap, HashSet};

use serde_json::Value;

use crate::error::ParseError;
use crate::model::{
    DefinitionDocument, Operation, ParameterDescriptor, ParameterLocation, PathItem, SchemaNode,
    SchemeReference, SecurityRequirement, SecurityScheme,
};

/// Extension naming the controller that owns a path item or operation.
pub const CONTROLLER_EXTENSION: &str = "x-swagger-router-controller";

/// Extension listing policies for a path item, operation or security scheme.
pub const POLICY_EXTENSION: &str = "x-swagger-router-policies";

/// HTTP methods we recognize in Swagger paths.
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "options", "head", "patch"];

type JsonObject = serde_json::Map<String, Value>;

/// Resolve a JSON Reference like `#/definitions/Pet` from the document root.
///
/// Only local references (`#/...`) are supported. Returns `None` for external refs.
fn resolve_ref<'a>(root: &'a Value, ref_path: &str) -> Option<&'a Value> {
    let pointer = ref_path.strip_prefix("#/")?;
    let mut current = root;
    for segment in pointer.split('/') {
        let unescaped = segment.replace("~1", "/").replace("~0", "~");
        current = current.get(&unescaped)?;
    }
    Some(current)
}

/// Recursively resolve all `$ref` pointers in a JSON value.
///
/// Inlines the referenced definition in place. `visited` tracks the current resolution
/// chain to detect circular references.
fn resolve_refs(
    value: &Value,
    root: &Value,
    visited: &mut HashSet<String>,
) -> Result<Value, ParseError> {
    match value {
        Value::Object(obj) => {
            if let Some(ref_str) = obj.get("$ref").and_then(|v| v.as_str()) {
                if !visited.insert(ref_str.to_string()) {
                    return Err(ParseError::SchemaError(format!(
                        "circular $ref detected: {}",
                        ref_str
                    )));
                }
                let target = resolve_ref(root, ref_str)
                    .ok_or_else(|| ParseError::UnresolvedRef(ref_str.to_string()))?;
                let resolved = resolve_refs(target, root, visited)?;
                visited.remove(ref_str);
                Ok(resolved)
            } else {
                let mut new_obj = serde_json::Map::with_capacity(obj.len());
                for (key, val) in obj {
                    new_obj.insert(key.clone(), resolve_refs(val, root, visited)?);
                }
                Ok(Value::Object(new_obj))
            }
        }
        Value::Array(arr) => {
            let items: Result<Vec<_>, _> = arr
                .iter()
                .map(|v| resolve_refs(v, root, visited))
                .collect();
            Ok(Value::Array(items?))
        }
        other => Ok(other.clone()),
    }
}

/// Parse a Swagger 2.0 definition from a YAML/JSON string.
pub fn parse_definition(input: &str) -> Result<DefinitionDocument, ParseError> {
    // Parse YAML (also handles JSON since JSON is valid YAML)
    let root: Value =
        serde_yaml::from_str(input).map_err(|e| ParseError::ParseError(e.to_string()))?;

    let root_obj = root
        .as_object()
        .ok_or_else(|| ParseError::ParseError("definition root must be an object".into()))?;

    let swagger = detect_version(root_obj)?;

    let title = root_obj
        .get("info")
        .and_then(|info| info.get("title"))
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    let base_path = root_obj
        .get("basePath")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(DefinitionDocument {
        filename: None,
        swagger,
        title,
        base_path,
        consumes: string_list(root_obj.get("consumes")).unwrap_or_default(),
        produces: string_list(root_obj.get("produces")).unwrap_or_default(),
        paths: parse_paths(root_obj, &root)?,
        security: parse_security(root_obj.get("security")).unwrap_or_default(),
        security_definitions: parse_security_definitions(root_obj),
    })
}

/// Parse a definition from a file path.
pub fn parse_definition_file(path: &std::path::Path) -> Result<DefinitionDocument, ParseError> {
    let content = std::fs::read_to_string(path)?;
    let mut document = parse_definition(&content)?;
    document.filename = path
        .file_name()
        .and_then(|s| s.to_str())
        .map(|s| s.to_string());
    Ok(document)
}

/// Check the `swagger` root field and return its version.
fn detect_version(root: &JsonObject) -> Result<String, ParseError> {
    if let Some(version) = root.get("swagger") {
        // `swagger: 2.0` unquoted in YAML arrives as a number
        let version = match version {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(ParseError::SchemaError("'swagger' must be a string".into())),
        };
        if !version.starts_with('2') {
            return Err(ParseError::SchemaError(format!(
                "unsupported Swagger version: {} (only 2.0 supported)",
                version
            )));
        }
        Ok(version)
    } else if let Some(version) = root.get("openapi").and_then(|v| v.as_str()) {
        Err(ParseError::SchemaError(format!(
            "unsupported OpenAPI version: {} (only Swagger 2.0 supported)",
            version
        )))
    } else {
        Err(ParseError::UnknownFormat)
    }
}

/// Read a list of strings, skipping non-string entries.
fn string_list(value: Option<&Value>) -> Option<Vec<String>> {
    value.and_then(|v| v.as_array()).map(|arr| {
        arr.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    })
}

/// Extract the controller extension from an object.
fn extract_controller(obj: &JsonObject) -> Option<String> {
    obj.get(CONTROLLER_EXTENSION)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

/// Extract the policies extension, accepting a comma-separated string or a
/// sequence of strings (joined with commas).
fn extract_policies(obj: &JsonObject) -> Option<String> {
    match obj.get(POLICY_EXTENSION)? {
        Value::String(s) => Some(s.clone()),
        Value::Array(arr) => Some(
            arr.iter()
                .filter_map(|v| v.as_str())
                .collect::<Vec<_>>()
                .join(","),
        ),
        _ => None,
    }
}

/// Parse a `security` list. Returns `None` when the field is absent.
fn parse_security(value: Option<&Value>) -> Option<Vec<SecurityRequirement>> {
    let arr = value?.as_array()?;
    Some(
        arr.iter()
            .filter_map(|item| item.as_object())
            .map(|requirement| SecurityRequirement {
                schemes: requirement
                    .iter()
                    .map(|(name, scopes)| SchemeReference {
                        name: name.clone(),
                        scopes: string_list(Some(scopes)).unwrap_or_default(),
                    })
                    .collect(),
            })
            .collect(),
    )
}

/// Parse `securityDefinitions` into schemes by name.
fn parse_security_definitions(root: &JsonObject) -> BTreeMap<String, SecurityScheme> {
    root.get("securityDefinitions")
        .and_then(|v| v.as_object())
        .map(|defs| {
            defs.iter()
                .filter_map(|(name, def)| {
                    let def = def.as_object()?;
                    Some((
                        name.clone(),
                        SecurityScheme {
                            scheme_type: def
                                .get("type")
                                .and_then(|v| v.as_str())
                                .unwrap_or_default()
                                .to_string(),
                            policies: extract_policies(def),
                        },
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Parse Swagger paths into path items, keeping document order.
fn parse_paths(root: &JsonObject, spec_root: &Value) -> Result<Vec<PathItem>, ParseError> {
    let mut items = Vec::new();

    let paths = match root.get("paths").and_then(|v| v.as_object()) {
        Some(p) => p,
        None => return Ok(items), // No paths is valid (empty API)
    };

    for (path, path_item) in paths {
        // Vendor extensions are allowed alongside path items
        if path.starts_with("x-") {
            continue;
        }
        let path_obj = path_item.as_object().ok_or_else(|| {
            ParseError::SchemaError(format!("path item for '{}' must be an object", path))
        })?;

        // Path-level parameters (inherited by all operations)
        let path_params = parse_parameters(path_obj, spec_root)?;

        let mut operations = Vec::new();
        for (method, op_value) in path_obj {
            if !HTTP_METHODS.contains(&method.as_str()) {
                continue;
            }
            let op_obj = op_value.as_object().ok_or_else(|| {
                ParseError::SchemaError(format!(
                    "operation {} {} must be an object",
                    method.to_uppercase(),
                    path
                ))
            })?;

            operations.push(Operation {
                method: method.to_uppercase(),
                operation_id: op_obj
                    .get("operationId")
                    .and_then(|v| v.as_str())
                    .map(|s| s.to_string()),
                parameters: merge_parameters(&path_params, parse_parameters(op_obj, spec_root)?),
                consumes: string_list(op_obj.get("consumes")),
                produces: string_list(op_obj.get("produces")),
                security: parse_security(op_obj.get("security")),
                controller: extract_controller(op_obj),
                policies: extract_policies(op_obj),
            });
        }

        items.push(PathItem {
            path: path.clone(),
            controller: extract_controller(path_obj),
            policies: extract_policies(path_obj),
            operations,
        });
    }

    Ok(items)
}

/// Merge path-level and operation-level parameters.
///
/// An operation parameter replaces the path-level one with the same name and location.
fn merge_parameters(
    path_params: &[ParameterDescriptor],
    op_params: Vec<ParameterDescriptor>,
) -> Vec<ParameterDescriptor> {
    let mut merged: Vec<ParameterDescriptor> = path_params
        .iter()
        .filter(|p| {
            !op_params
                .iter()
                .any(|o| o.name == p.name && o.location == p.location)
        })
        .cloned()
        .collect();
    merged.extend(op_params);
    merged
}

/// Parse parameters from a path item or operation object.
///
/// Non-body parameters carry their type description inline; body parameters
/// carry it under `schema`.
fn parse_parameters(
    obj: &JsonObject,
    spec_root: &Value,
) -> Result<Vec<ParameterDescriptor>, ParseError> {
    let Some(arr) = obj.get("parameters").and_then(|v| v.as_array()) else {
        return Ok(Vec::new());
    };

    let mut params = Vec::with_capacity(arr.len());
    for item in arr {
        let resolved = resolve_refs(item, spec_root, &mut HashSet::new())?;
        let Some(param_obj) = resolved.as_object() else {
            continue;
        };
        let Some(location) = param_obj
            .get("in")
            .and_then(|v| v.as_str())
            .and_then(ParameterLocation::parse)
        else {
            continue;
        };
        let Some(name) = param_obj.get("name").and_then(|v| v.as_str()) else {
            continue;
        };

        let schema = match location {
            ParameterLocation::Body => param_obj.get("schema").map(SchemaNode::from_value),
            _ => Some(SchemaNode::from_value(&resolved)),
        };

        params.push(ParameterDescriptor {
            name: name.to_string(),
            location,
            required: param_obj
                .get("required")
                .and_then(|v| v.as_bool())
                .unwrap_or(false),
            schema,
        });
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_definition() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
  version: "1.0.0"
basePath: /v2
paths:
  /health:
    get:
      operationId: getHealth
"#;
        let doc = parse_definition(yaml).unwrap();
        assert_eq!(doc.swagger, "2.0");
        assert_eq!(doc.title, "Test API");
        assert_eq!(doc.base_path, "/v2");
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].path, "/health");
        assert_eq!(doc.paths[0].operations[0].method, "GET");
        assert_eq!(
            doc.paths[0].operations[0].operation_id.as_deref(),
            Some("getHealth")
        );
    }

    #[test]
    fn accept_unquoted_version() {
        let yaml = "swagger: 2.0\ninfo:\n  title: T\npaths: {}\n";
        let doc = parse_definition(yaml).unwrap();
        assert_eq!(doc.swagger, "2.0");
        assert!(doc.paths.is_empty());
    }

    #[test]
    fn reject_openapi_3() {
        let yaml = r#"
openapi: "3.0.0"
info:
  title: Test API
paths: {}
"#;
        let err = parse_definition(yaml).unwrap_err();
        assert!(matches!(err, ParseError::SchemaError(_)));
    }

    #[test]
    fn reject_unknown_format() {
        let err = parse_definition("info:\n  title: nothing\n").unwrap_err();
        assert!(matches!(err, ParseError::UnknownFormat));
    }

    #[test]
    fn reject_invalid_yaml() {
        let err = parse_definition("swagger: [unclosed").unwrap_err();
        assert!(matches!(err, ParseError::ParseError(_)));
    }

    #[test]
    fn paths_and_methods_keep_document_order() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
paths:
  /zebra:
    post:
      operationId: addZebra
    get:
      operationId: listZebras
  /apple:
    delete:
      operationId: deleteApple
"#;
        let doc = parse_definition(yaml).unwrap();
        let paths: Vec<_> = doc.paths.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["/zebra", "/apple"]);
        let methods: Vec<_> = doc.paths[0]
            .operations
            .iter()
            .map(|o| o.method.as_str())
            .collect();
        assert_eq!(methods, vec!["POST", "GET"]);
    }

    #[test]
    fn extension_keys_are_not_operations() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
paths:
  /pet:
    x-swagger-router-controller: PetController
    x-swagger-router-policies: "Audit"
    parameters:
      - name: tenant
        in: header
        type: string
    get:
      operationId: listPets
"#;
        let doc = parse_definition(yaml).unwrap();
        let item = &doc.paths[0];
        assert_eq!(item.controller.as_deref(), Some("PetController"));
        assert_eq!(item.policies.as_deref(), Some("Audit"));
        assert_eq!(item.operations.len(), 1);
        assert_eq!(item.operations[0].parameters[0].name, "tenant");
    }

    #[test]
    fn parse_inline_parameter_schema() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
paths:
  /pet/{petId}:
    get:
      operationId: getPet
      parameters:
        - name: petId
          in: path
          required: true
          type: integer
          format: int64
        - name: status
          in: query
          type: array
          items:
            type: string
            enum: [available, sold]
"#;
        let doc = parse_definition(yaml).unwrap();
        let params = &doc.paths[0].operations[0].parameters;
        assert_eq!(params.len(), 2);

        assert_eq!(params[0].location, ParameterLocation::Path);
        assert!(params[0].required);
        let schema = params[0].schema.as_ref().unwrap();
        assert_eq!(schema.schema_type.as_deref(), Some("integer"));
        assert_eq!(schema.format.as_deref(), Some("int64"));
        assert!(schema.required.is_empty());

        let items = params[1].schema.as_ref().unwrap().items.as_ref().unwrap();
        assert_eq!(items.enum_values.len(), 2);
    }

    #[test]
    fn parse_body_parameter_with_ref() {
        let yaml = r##"
swagger: "2.0"
info:
  title: Test API
paths:
  /pet:
    post:
      operationId: addPet
      parameters:
        - name: body
          in: body
          required: true
          schema:
            $ref: "#/definitions/Pet"
definitions:
  Pet:
    type: object
    required: [name]
    properties:
      name:
        type: string
        maxLength: 64
      tag:
        $ref: "#/definitions/Tag"
  Tag:
    type: object
    properties:
      label:
        type: string
"##;
        let doc = parse_definition(yaml).unwrap();
        let body = &doc.paths[0].operations[0].parameters[0];
        assert_eq!(body.location, ParameterLocation::Body);
        let schema = body.schema.as_ref().unwrap();
        assert_eq!(schema.required, vec!["name".to_string()]);
        assert_eq!(schema.properties["name"].max_length, Some(64));
        assert_eq!(
            schema.properties["tag"].properties["label"]
                .schema_type
                .as_deref(),
            Some("string")
        );
    }

    #[test]
    fn reject_circular_ref() {
        let yaml = r##"
swagger: "2.0"
info:
  title: Test API
paths:
  /node:
    post:
      operationId: addNode
      parameters:
        - name: body
          in: body
          schema:
            $ref: "#/definitions/Node"
definitions:
  Node:
    type: object
    properties:
      child:
        $ref: "#/definitions/Node"
"##;
        let err = parse_definition(yaml).unwrap_err();
        assert!(matches!(err, ParseError::SchemaError(ref m) if m.contains("circular")));
    }

    #[test]
    fn reject_unresolved_ref() {
        let yaml = r##"
swagger: "2.0"
info:
  title: Test API
paths:
  /pet:
    post:
      operationId: addPet
      parameters:
        - name: body
          in: body
          schema:
            $ref: "#/definitions/Missing"
"##;
        let err = parse_definition(yaml).unwrap_err();
        assert!(matches!(err, ParseError::UnresolvedRef(_)));
    }

    #[test]
    fn operation_parameter_overrides_path_parameter() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
paths:
  /pet/{petId}:
    parameters:
      - name: petId
        in: path
        required: true
        type: string
      - name: trace
        in: header
        type: string
    get:
      operationId: getPet
      parameters:
        - name: petId
          in: path
          required: true
          type: integer
"#;
        let doc = parse_definition(yaml).unwrap();
        let params = &doc.paths[0].operations[0].parameters;
        assert_eq!(params.len(), 2);
        assert_eq!(params[0].name, "trace");
        assert_eq!(
            params[1].schema.as_ref().unwrap().schema_type.as_deref(),
            Some("integer")
        );
    }

    #[test]
    fn parse_security_and_extensions() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
security:
  - api_key: []
securityDefinitions:
  api_key:
    type: apiKey
    name: api_key
    in: header
    x-swagger-router-policies: "ApiKeyPolicy.check"
  petstore_auth:
    type: oauth2
    x-swagger-router-policies: [Auth.bearer, Auth.scopes]
paths:
  /pet:
    post:
      operationId: addPet
      x-swagger-router-controller: PetController
      x-swagger-router-policies: "Audit.log"
      consumes: [application/json]
      security:
        - petstore_auth: [write:pets, read:pets]
"#;
        let doc = parse_definition(yaml).unwrap();
        assert_eq!(doc.security, vec![SecurityRequirement::of(["api_key"])]);
        assert_eq!(
            doc.security_definitions["api_key"].policies.as_deref(),
            Some("ApiKeyPolicy.check")
        );
        assert_eq!(
            doc.security_definitions["petstore_auth"].policies.as_deref(),
            Some("Auth.bearer,Auth.scopes")
        );

        let op = &doc.paths[0].operations[0];
        assert_eq!(op.controller.as_deref(), Some("PetController"));
        assert_eq!(op.policies.as_deref(), Some("Audit.log"));
        assert_eq!(op.consumes, Some(vec!["application/json".to_string()]));
        assert!(op.produces.is_none());
        let security = op.security.as_ref().unwrap();
        assert_eq!(security[0].schemes[0].name, "petstore_auth");
        assert_eq!(security[0].schemes[0].scopes.len(), 2);
    }

    #[test]
    fn explicit_empty_security_is_kept() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Test API
paths:
  /public:
    get:
      operationId: getPublic
      security: []
"#;
        let doc = parse_definition(yaml).unwrap();
        assert_eq!(doc.paths[0].operations[0].security, Some(Vec::new()));
    }

    #[test]
    fn paths_vendor_extensions_are_skipped() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Extended
paths:
  x-generated-by: tooling
  x-routing:
    get:
      operationId: notAnOperation
  /pets:
    get:
      operationId: list
"#;
        let doc = parse_definition(yaml).unwrap();
        assert_eq!(doc.paths.len(), 1);
        assert_eq!(doc.paths[0].path, "/pets");
        assert_eq!(doc.paths[0].operations[0].operation_id.as_deref(), Some("list"));
    }

    #[test]
    fn non_object_path_item_is_rejected() {
        let yaml = r#"
swagger: "2.0"
info:
  title: Broken
paths:
  /pets: tooling
"#;
        let err = parse_definition(yaml).unwrap_err();
        assert!(matches!(err, ParseError::SchemaError(ref m) if m.contains("/pets")));
    }
}
