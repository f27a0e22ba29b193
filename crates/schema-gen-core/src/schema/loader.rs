//! JSON-Schema subset loader: converts a [`serde_json::Value`] in
//! JSON-Schema shape into a [`Schema`].
//!
//! This is a convenience for callers who have a JSON-Schema document on
//! hand; it is not part of `Generator`'s interface. It dispatches on
//! `"type"` the same way a grammar compiler would, but builds a `Node` tree
//! instead of a grammar string.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::Node;
use super::Schema;

/// Errors raised while interpreting a JSON-Schema document. Distinct from
/// [`crate::error::GeneratorError`]: these are schema-authoring mistakes,
/// not generation failures, and happen before a `Generator` exists.
#[derive(Debug)]
pub enum LoaderError {
    MissingType,
    UnsupportedType(String),
    InvalidEnum,
    MalformedRef(String),
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::MissingType => write!(f, "schema node has no \"type\", \"$ref\", or \"anyOf\""),
            LoaderError::UnsupportedType(t) => write!(f, "unsupported schema type: {t}"),
            LoaderError::InvalidEnum => write!(f, "\"enum\" must be a non-empty array of strings"),
            LoaderError::MalformedRef(r) => write!(f, "malformed $ref: {r}"),
        }
    }
}

impl std::error::Error for LoaderError {}

/// Parse a top-level JSON-Schema document (with an optional `$defs` table)
/// into a [`Schema`].
pub fn from_json_schema(value: &Value) -> Result<Schema, LoaderError> {
    let mut defs = BTreeMap::new();
    if let Some(defs_obj) = value.get("$defs").and_then(Value::as_object) {
        for (name, def_value) in defs_obj {
            defs.insert(name.clone(), node_from_value(def_value)?);
        }
    }
    let root = node_from_value(value)?;
    Ok(Schema { root, defs })
}

fn node_from_value(value: &Value) -> Result<Node, LoaderError> {
    if let Some(reference) = value.get("$ref").and_then(Value::as_str) {
        let name = reference
            .strip_prefix("#/$defs/")
            .ok_or_else(|| LoaderError::MalformedRef(reference.to_string()))?;
        return Ok(Node::Ref(name.to_string()));
    }

    if let Some(variants) = value.get("anyOf").and_then(Value::as_array) {
        let nodes = variants
            .iter()
            .map(node_from_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Node::AnyOf(nodes));
    }

    match value.get("type").and_then(Value::as_str) {
        Some("object") => object_from_value(value),
        Some("array") => array_from_value(value),
        Some("string") => string_from_value(value),
        Some("number") => Ok(Node::number(
            value.get("minimum").and_then(Value::as_f64),
            value.get("maximum").and_then(Value::as_f64),
        )),
        Some("integer") => Ok(Node::integer(
            value.get("minimum").and_then(Value::as_f64),
            value.get("maximum").and_then(Value::as_f64),
        )),
        Some("boolean") => Ok(Node::Boolean),
        Some(other) => Err(LoaderError::UnsupportedType(other.to_string())),
        None => Err(LoaderError::MissingType),
    }
}

fn object_from_value(value: &Value) -> Result<Node, LoaderError> {
    let mut properties = BTreeMap::new();
    if let Some(props) = value.get("properties").and_then(Value::as_object) {
        for (name, prop_value) in props {
            properties.insert(name.clone(), node_from_value(prop_value)?);
        }
    }
    let required = value
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();
    Ok(Node::Object {
        properties,
        required,
    })
}

fn array_from_value(value: &Value) -> Result<Node, LoaderError> {
    let items = match value.get("items") {
        Some(items_value) => node_from_value(items_value)?,
        None => Node::string(),
    };
    let min_items = value
        .get("minItems")
        .and_then(Value::as_u64)
        .map(|n| n as usize);
    let max_items = value
        .get("maxItems")
        .and_then(Value::as_u64)
        .map(|n| n as usize);
    Ok(Node::array(items, min_items, max_items))
}

fn string_from_value(value: &Value) -> Result<Node, LoaderError> {
    match value.get("enum") {
        Some(Value::Array(values)) if !values.is_empty() => {
            let choices = values
                .iter()
                .map(|v| v.as_str().map(String::from).ok_or(LoaderError::InvalidEnum))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Node::string_enum(choices))
        }
        Some(_) => Err(LoaderError::InvalidEnum),
        None => Ok(Node::string()),
    }
}
