//! Schema node to validation rule translation.
//!
//! Precondition: schemas are acyclic. The parser inlines local `$ref`s and
//! rejects cycles; the depth limit in [`CompileOptions`] catches anything
//! that still nests too far.

use std::collections::BTreeMap;

use designfirst_spec_parser::SchemaNode;

use crate::error::CompileError;
use crate::options::CompileOptions;
use crate::rule::ValidationRule;

/// Formats that override the declared `type`.
const FORMAT_TYPES: &[(&str, &str)] = &[
    ("int32", "integer"),
    ("int64", "integer"),
    ("float", "double"),
    ("double", "double"),
    ("byte", "byte"),
    ("binary", "binary"),
];

/// Which base rule an effective type selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BaseRule {
    Object,
    Array,
    Base64,
    Date,
    Integer,
    Number,
    Boolean,
    String,
}

/// Resolve the effective type of a node: a known `format` wins over `type`.
fn effective_type(node: &SchemaNode) -> Option<&str> {
    node.format
        .as_deref()
        .and_then(|format| {
            FORMAT_TYPES
                .iter()
                .find(|(f, _)| *f == format)
                .map(|(_, ty)| *ty)
        })
        .or(node.schema_type.as_deref())
}

fn base_rule(effective_type: Option<&str>) -> BaseRule {
    match effective_type {
        Some("object") => BaseRule::Object,
        Some("array") => BaseRule::Array,
        Some("byte") => BaseRule::Base64,
        Some("date") | Some("dateTime") => BaseRule::Date,
        Some("integer") => BaseRule::Integer,
        Some("long") | Some("float") | Some("double") => BaseRule::Number,
        Some("boolean") => BaseRule::Boolean,
        // Unknown or absent types (including `binary`) accept any string.
        _ => BaseRule::String,
    }
}

/// Compile one schema node.
///
/// `required` is the flag the enclosing object (or parameter) puts on this
/// node. Returns `Ok(None)` when there is no node to compile.
pub fn compile_schema(
    node: Option<&SchemaNode>,
    required: bool,
    location: &str,
    options: &CompileOptions,
) -> Result<Option<ValidationRule>, CompileError> {
    node.map(|node| SchemaCompiler::new(location, options).compile(node, required, 0))
        .transpose()
}

/// Compile the properties of an object node into keyed rules, marking each
/// property named in the node's `required` list.
pub fn compile_properties(
    node: &SchemaNode,
    location: &str,
    options: &CompileOptions,
) -> Result<BTreeMap<String, ValidationRule>, CompileError> {
    SchemaCompiler::new(location, options).properties(node, 1)
}

struct SchemaCompiler<'a> {
    location: &'a str,
    max_depth: usize,
}

impl<'a> SchemaCompiler<'a> {
    fn new(location: &'a str, options: &CompileOptions) -> Self {
        Self {
            location,
            max_depth: options.max_schema_depth,
        }
    }

    fn compile(
        &self,
        node: &SchemaNode,
        required: bool,
        depth: usize,
    ) -> Result<ValidationRule, CompileError> {
        if depth > self.max_depth {
            return Err(CompileError::SchemaTooDeep(format!(
                "{} - depth exceeds limit {}",
                self.location, self.max_depth
            )));
        }

        let rule = match base_rule(effective_type(node)) {
            BaseRule::Object => ValidationRule::object(self.properties(node, depth + 1)?),
            BaseRule::Array => {
                let items = node
                    .items
                    .as_deref()
                    .map(|items| self.compile(items, false, depth + 1))
                    .transpose()?;
                ValidationRule::array(items)
            }
            BaseRule::Base64 => ValidationRule::base64(),
            BaseRule::Date => ValidationRule::date(),
            BaseRule::Integer => ValidationRule::integer(),
            BaseRule::Number => ValidationRule::number(),
            BaseRule::Boolean => ValidationRule::boolean(),
            BaseRule::String => ValidationRule::string(),
        };

        Ok(apply_modifiers(rule, node, required))
    }

    fn properties(
        &self,
        node: &SchemaNode,
        depth: usize,
    ) -> Result<BTreeMap<String, ValidationRule>, CompileError> {
        node.properties
            .iter()
            .map(|(name, property)| {
                let required = node.required.iter().any(|r| r == name);
                Ok((name.clone(), self.compile(property, required, depth)?))
            })
            .collect()
    }
}

/// Apply constraint modifiers in their fixed order. A later bound of the
/// same kind replaces an earlier one, so `maximum` overrides `maxLength`.
fn apply_modifiers(mut rule: ValidationRule, node: &SchemaNode, required: bool) -> ValidationRule {
    if let Some(pattern) = &node.pattern {
        rule = rule.pattern(pattern.clone());
    }
    if let Some(length) = node.length {
        rule = rule.length(length);
    }
    if let Some(max) = node.max_items.or(node.max_length) {
        rule = rule.max(max);
    }
    if let Some(min) = node.min_items.or(node.min_length) {
        rule = rule.min(min);
    }
    if !node.enum_values.is_empty() {
        rule = rule.valid(node.enum_values.clone());
    }
    if let Some(maximum) = &node.maximum {
        rule = rule.max(maximum.clone());
    }
    if let Some(minimum) = &node.minimum {
        rule = rule.min(minimum.clone());
    }
    if required {
        rule = rule.required();
    }
    rule
}
