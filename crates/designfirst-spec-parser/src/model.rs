use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// A parsed Swagger 2.0 definition document.
///
/// Immutable once parsed; the compiler only reads it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionDocument {
    /// Source file name, set by [`crate::parse_definition_file`].
    #[serde(default)]
    pub filename: Option<String>,
    /// The `swagger` version string (e.g. "2.0").
    pub swagger: String,
    /// The `info.title` field (empty when absent).
    #[serde(default)]
    pub title: String,
    /// The `basePath` prefix shared by every path template.
    #[serde(default)]
    pub base_path: String,
    /// Document-level default request media types.
    #[serde(default)]
    pub consumes: Vec<String>,
    /// Document-level default response media types.
    #[serde(default)]
    pub produces: Vec<String>,
    /// Path items in document order.
    #[serde(default)]
    pub paths: Vec<PathItem>,
    /// Document-level default security requirements.
    #[serde(default)]
    pub security: Vec<SecurityRequirement>,
    /// Security schemes by name.
    #[serde(default)]
    pub security_definitions: BTreeMap<String, SecurityScheme>,
}

/// One entry of `paths`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    /// The path template (e.g. "/pet/{petId}").
    pub path: String,
    /// Controller from `x-swagger-router-controller`, inherited by operations.
    #[serde(default)]
    pub controller: Option<String>,
    /// Comma-separated policies from `x-swagger-router-policies`.
    #[serde(default)]
    pub policies: Option<String>,
    /// Operations in document method order.
    #[serde(default)]
    pub operations: Vec<Operation>,
}

/// A single operation (path + method).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Operation {
    /// The HTTP method (uppercase).
    pub method: String,
    /// The `operationId`, if present.
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Path-level and operation-level parameters, merged.
    #[serde(default)]
    pub parameters: Vec<ParameterDescriptor>,
    /// Request media types; `None` inherits the document default.
    #[serde(default)]
    pub consumes: Option<Vec<String>>,
    /// Response media types; `None` inherits the document default.
    #[serde(default)]
    pub produces: Option<Vec<String>>,
    /// Security requirements; `None` inherits the document default.
    #[serde(default)]
    pub security: Option<Vec<SecurityRequirement>>,
    /// Operation-level controller override.
    #[serde(default)]
    pub controller: Option<String>,
    /// Operation-level comma-separated policies.
    #[serde(default)]
    pub policies: Option<String>,
}

/// Where a parameter travels in the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
    Body,
    FormData,
}

impl ParameterLocation {
    /// Parse the `in` field of a parameter object.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "query" => Some(Self::Query),
            "path" => Some(Self::Path),
            "header" => Some(Self::Header),
            "body" => Some(Self::Body),
            "formData" => Some(Self::FormData),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Path => "path",
            Self::Header => "header",
            Self::Body => "body",
            Self::FormData => "formData",
        }
    }
}

/// A parameter declaration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
    /// For `body` parameters the `schema` object, otherwise the inline
    /// type description carried by the parameter itself.
    #[serde(default)]
    pub schema: Option<SchemaNode>,
}

/// A JSON-Schema-like type description.
///
/// Recursive through `properties` and `items`. Documents must be acyclic;
/// the parser inlines local `$ref`s and rejects cycles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaNode {
    #[serde(rename = "type", default)]
    pub schema_type: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, SchemaNode>,
    #[serde(default)]
    pub items: Option<Box<SchemaNode>>,
    /// Object-level list of required property names.
    #[serde(default)]
    pub required: Vec<String>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub min_length: Option<u64>,
    #[serde(default)]
    pub max_length: Option<u64>,
    #[serde(default)]
    pub min_items: Option<u64>,
    #[serde(default)]
    pub max_items: Option<u64>,
    #[serde(default)]
    pub minimum: Option<Number>,
    #[serde(default)]
    pub maximum: Option<Number>,
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<Value>,
}

impl SchemaNode {
    /// Build a node from a (reference-resolved) JSON object.
    ///
    /// Unknown keys are ignored. A non-array `required` (the boolean flag of
    /// a Swagger parameter object) yields an empty required list.
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let string = |key: &str| obj.get(key).and_then(|v| v.as_str()).map(str::to_string);
        let unsigned = |key: &str| obj.get(key).and_then(|v| v.as_u64());
        let number = |key: &str| match obj.get(key) {
            Some(Value::Number(n)) => Some(n.clone()),
            _ => None,
        };

        let properties = obj
            .get("properties")
            .and_then(|v| v.as_object())
            .map(|props| {
                props
                    .iter()
                    .map(|(name, prop)| (name.clone(), SchemaNode::from_value(prop)))
                    .collect()
            })
            .unwrap_or_default();

        let required = obj
            .get("required")
            .and_then(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            schema_type: string("type"),
            format: string("format"),
            properties,
            items: obj
                .get("items")
                .filter(|v| v.is_object())
                .map(|v| Box::new(SchemaNode::from_value(v))),
            required,
            pattern: string("pattern"),
            length: unsigned("length"),
            min_length: unsigned("minLength"),
            max_length: unsigned("maxLength"),
            min_items: unsigned("minItems"),
            max_items: unsigned("maxItems"),
            minimum: number("minimum"),
            maximum: number("maximum"),
            enum_values: obj
                .get("enum")
                .and_then(|v| v.as_array())
                .cloned()
                .unwrap_or_default(),
        }
    }
}

/// One alternative of a `security` list.
///
/// Scheme references keep document order, since the policies they carry
/// accumulate in that order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    pub schemes: Vec<SchemeReference>,
}

/// A named security scheme demanded by a requirement, with its scopes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeReference {
    pub name: String,
    #[serde(default)]
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    /// Requirement naming the given schemes, without scopes.
    pub fn of<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schemes: names
                .into_iter()
                .map(|name| SchemeReference {
                    name: name.into(),
                    scopes: Vec::new(),
                })
                .collect(),
        }
    }

    /// Scheme names in document order.
    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(|s| s.name.as_str())
    }
}

/// An entry of `securityDefinitions`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// The scheme `type` (basic, apiKey, oauth2).
    #[serde(rename = "type", default)]
    pub scheme_type: String,
    /// Comma-separated policies from `x-swagger-router-policies`.
    #[serde(default)]
    pub policies: Option<String>,
}
