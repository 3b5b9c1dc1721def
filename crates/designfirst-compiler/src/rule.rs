//! Composable validation rules.
//!
//! A [`ValidationRule`] is the compiled form of one schema node: a base kind
//! plus constraint modifiers. Rules are engine-agnostic; [`ValidationRule::to_json_schema`]
//! renders them as JSON Schema, which is also what they serialize to.

use std::collections::BTreeMap;
use std::mem::discriminant;

use serde::{Serialize, Serializer};
use serde_json::{json, Map, Number, Value};

/// Accepts standard padded base64.
const BASE64_PATTERN: &str = "^(?:[A-Za-z0-9+/]{4})*(?:[A-Za-z0-9+/]{2}==|[A-Za-z0-9+/]{3}=)?$";

/// The base kind of a rule.
#[derive(Debug, Clone, PartialEq)]
pub enum RuleKind {
    /// Free-form string; also the fallback for unknown types.
    String,
    /// Base64-encoded string.
    Base64,
    /// Date, as an ISO date / date-time string or a timestamp.
    Date,
    /// Whole number.
    Integer,
    /// Any number.
    Number,
    Boolean,
    /// Keyed object. Keys not listed are rejected unless `allow_unknown`.
    Object {
        keys: BTreeMap<String, ValidationRule>,
        allow_unknown: bool,
    },
    /// Sequence whose elements all match `items` (any element when `None`).
    Array { items: Option<Box<ValidationRule>> },
}

/// A constraint modifier. At most one constraint of each variant is kept;
/// applying a variant again replaces the earlier one.
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    Pattern(String),
    /// Exact length (characters, items or keys depending on the kind).
    Length(u64),
    /// Upper bound: a length for strings, arrays and objects, a value for numbers.
    Max(Number),
    /// Lower bound, same interpretation as [`Constraint::Max`].
    Min(Number),
    /// Allowed values.
    Valid(Vec<Value>),
}

/// A compiled validation rule.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    pub kind: RuleKind,
    pub constraints: Vec<Constraint>,
    /// Whether the enclosing object must carry this key.
    pub required: bool,
    /// Whether `null` is accepted in place of a value.
    pub nullable: bool,
}

impl ValidationRule {
    pub fn new(kind: RuleKind) -> Self {
        Self {
            kind,
            constraints: Vec::new(),
            required: false,
            nullable: false,
        }
    }

    pub fn string() -> Self {
        Self::new(RuleKind::String)
    }

    pub fn base64() -> Self {
        Self::new(RuleKind::Base64)
    }

    pub fn date() -> Self {
        Self::new(RuleKind::Date)
    }

    pub fn integer() -> Self {
        Self::new(RuleKind::Integer)
    }

    pub fn number() -> Self {
        Self::new(RuleKind::Number)
    }

    pub fn boolean() -> Self {
        Self::new(RuleKind::Boolean)
    }

    /// Object rule with exactly the given keys.
    pub fn object(keys: BTreeMap<String, ValidationRule>) -> Self {
        Self::new(RuleKind::Object {
            keys,
            allow_unknown: false,
        })
    }

    /// Permissive rule for a channel with nothing declared: any object, or null.
    pub fn open_object() -> Self {
        Self::object(BTreeMap::new()).allow_unknown().allow_null()
    }

    pub fn array(items: Option<ValidationRule>) -> Self {
        Self::new(RuleKind::Array {
            items: items.map(Box::new),
        })
    }

    pub fn pattern(self, pattern: impl Into<String>) -> Self {
        self.constrain(Constraint::Pattern(pattern.into()))
    }

    pub fn length(self, length: u64) -> Self {
        self.constrain(Constraint::Length(length))
    }

    pub fn max(self, max: impl Into<Number>) -> Self {
        self.constrain(Constraint::Max(max.into()))
    }

    pub fn min(self, min: impl Into<Number>) -> Self {
        self.constrain(Constraint::Min(min.into()))
    }

    pub fn valid(self, values: Vec<Value>) -> Self {
        self.constrain(Constraint::Valid(values))
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn allow_null(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Accept keys the object rule does not list. No effect on other kinds.
    pub fn allow_unknown(mut self) -> Self {
        if let RuleKind::Object { allow_unknown, .. } = &mut self.kind {
            *allow_unknown = true;
        }
        self
    }

    fn constrain(mut self, constraint: Constraint) -> Self {
        self.constraints
            .retain(|existing| discriminant(existing) != discriminant(&constraint));
        self.constraints.push(constraint);
        self
    }

    /// The keyed children of an object rule.
    pub fn keys(&self) -> Option<&BTreeMap<String, ValidationRule>> {
        match &self.kind {
            RuleKind::Object { keys, .. } => Some(keys),
            _ => None,
        }
    }

    /// Render this rule as a JSON Schema document.
    ///
    /// Constraints that have no meaning for the rule's kind (a pattern on an
    /// integer, a length bound on a date) are kept on the rule but not rendered.
    pub fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();

        match &self.kind {
            RuleKind::String => {
                schema.insert("type".into(), json!("string"));
            }
            RuleKind::Base64 => {
                schema.insert("type".into(), json!("string"));
                schema.insert("contentEncoding".into(), json!("base64"));
                // The base64 alphabet check lives under allOf so a declared
                // pattern can sit beside it.
                schema.insert("allOf".into(), json!([{ "pattern": BASE64_PATTERN }]));
            }
            RuleKind::Date => {
                schema.insert(
                    "anyOf".into(),
                    json!([
                        { "type": "string", "format": "date" },
                        { "type": "string", "format": "date-time" },
                        { "type": "integer" }
                    ]),
                );
            }
            RuleKind::Integer => {
                schema.insert("type".into(), json!("integer"));
            }
            RuleKind::Number => {
                schema.insert("type".into(), json!("number"));
            }
            RuleKind::Boolean => {
                schema.insert("type".into(), json!("boolean"));
            }
            RuleKind::Object {
                keys,
                allow_unknown,
            } => {
                schema.insert("type".into(), json!("object"));
                let properties: Map<String, Value> = keys
                    .iter()
                    .map(|(name, rule)| (name.clone(), rule.to_json_schema()))
                    .collect();
                schema.insert("properties".into(), Value::Object(properties));
                let required: Vec<Value> = keys
                    .iter()
                    .filter(|(_, rule)| rule.required)
                    .map(|(name, _)| json!(name))
                    .collect();
                if !required.is_empty() {
                    schema.insert("required".into(), Value::Array(required));
                }
                schema.insert("additionalProperties".into(), json!(allow_unknown));
            }
            RuleKind::Array { items } => {
                schema.insert("type".into(), json!("array"));
                if let Some(items) = items {
                    schema.insert("items".into(), items.to_json_schema());
                }
            }
        }

        for constraint in &self.constraints {
            self.render_constraint(constraint, &mut schema);
        }

        let schema = Value::Object(schema);
        if self.nullable {
            json!({ "anyOf": [schema, { "type": "null" }] })
        } else {
            schema
        }
    }

    fn render_constraint(&self, constraint: &Constraint, schema: &mut Map<String, Value>) {
        // (lower, upper) keyword pair for length-like bounds
        let length_keywords = match &self.kind {
            RuleKind::String | RuleKind::Base64 => Some(("minLength", "maxLength")),
            RuleKind::Array { .. } => Some(("minItems", "maxItems")),
            RuleKind::Object { .. } => Some(("minProperties", "maxProperties")),
            _ => None,
        };
        let numeric = matches!(self.kind, RuleKind::Integer | RuleKind::Number);

        match constraint {
            Constraint::Pattern(pattern) => {
                if matches!(self.kind, RuleKind::String | RuleKind::Base64) {
                    schema.insert("pattern".into(), json!(pattern));
                }
            }
            Constraint::Length(length) => {
                if let Some((lower, upper)) = length_keywords {
                    schema.insert(lower.into(), json!(length));
                    schema.insert(upper.into(), json!(length));
                }
            }
            Constraint::Max(bound) => {
                if let Some((_, upper)) = length_keywords {
                    if let Some(n) = bound.as_u64() {
                        schema.insert(upper.into(), json!(n));
                    }
                } else if numeric {
                    schema.insert("maximum".into(), Value::Number(bound.clone()));
                }
            }
            Constraint::Min(bound) => {
                if let Some((lower, _)) = length_keywords {
                    if let Some(n) = bound.as_u64() {
                        schema.insert(lower.into(), json!(n));
                    }
                } else if numeric {
                    schema.insert("minimum".into(), Value::Number(bound.clone()));
                }
            }
            Constraint::Valid(values) => {
                schema.insert("enum".into(), Value::Array(values.clone()));
            }
        }
    }
}

impl Serialize for ValidationRule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_schema().serialize(serializer)
    }
}

/// The request part a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Headers,
    Params,
    Query,
    Payload,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Headers,
        Channel::Params,
        Channel::Query,
        Channel::Payload,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Headers => "headers",
            Channel::Params => "params",
            Channel::Query => "query",
            Channel::Payload => "payload",
        }
    }
}

/// Per-channel validation for one route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteValidation {
    pub headers: ValidationRule,
    pub params: ValidationRule,
    pub query: ValidationRule,
    pub payload: ValidationRule,
}

impl RouteValidation {
    pub fn channel(&self, channel: Channel) -> &ValidationRule {
        match channel {
            Channel::Headers => &self.headers,
            Channel::Params => &self.params,
            Channel::Query => &self.query,
            Channel::Payload => &self.payload,
        }
    }

    /// One object schema keyed by channel name.
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = Channel::ALL
            .iter()
            .map(|c| (c.as_str().to_string(), self.channel(*c).to_json_schema()))
            .collect();
        json!({ "type": "object", "properties": properties })
    }
}
