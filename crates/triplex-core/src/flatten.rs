//! Property flattening
//!
//! Graph stores hold primitive properties (and arrays of primitives) on nodes
//! and edges, not nested documents. Flattening never fails: anything that has
//! no native representation degrades to a JSON string.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

use crate::normalize::normalize_text;

/// Primitive property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Value stored on a node or edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Scalar>),
}

impl PropertyValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

/// Flat property map, ordered by key
pub type FlatProperties = BTreeMap<String, PropertyValue>;

/// Flatten a nested attribute payload.
///
/// - nested objects recurse, joining key paths with `_`
/// - arrays of primitives are kept as lists
/// - arrays holding anything else become a JSON string
/// - strings pass through [`normalize_text`]
/// - numbers and booleans pass through unchanged
/// - `null` drops the key
pub fn flatten_properties(properties: &Map<String, Value>) -> FlatProperties {
    let mut flat = FlatProperties::new();
    flatten_into(properties, "", &mut flat);
    flat
}

fn flatten_into(map: &Map<String, Value>, prefix: &str, out: &mut FlatProperties) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}_{}", prefix, key)
        };

        match value {
            Value::Object(child) => flatten_into(child, &path, out),
            Value::Array(items) => {
                let flattened = match primitive_list(items) {
                    Some(list) => PropertyValue::List(list),
                    None => PropertyValue::Text(value.to_string()),
                };
                out.insert(path, flattened);
            }
            Value::String(s) => {
                out.insert(path, PropertyValue::Text(normalize_text(s)));
            }
            Value::Number(n) => {
                out.insert(path, number_value(n));
            }
            Value::Bool(b) => {
                out.insert(path, PropertyValue::Bool(*b));
            }
            Value::Null => {}
        }
    }
}

fn primitive_list(items: &[Value]) -> Option<Vec<Scalar>> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => Some(Scalar::Text(s.clone())),
            Value::Bool(b) => Some(Scalar::Bool(*b)),
            Value::Number(n) => Some(match number_value(n) {
                PropertyValue::Int(i) => Scalar::Int(i),
                PropertyValue::Float(f) => Scalar::Float(f),
                _ => Scalar::Text(n.to_string()),
            }),
            _ => None,
        })
        .collect()
}

fn number_value(n: &Number) -> PropertyValue {
    if let Some(i) = n.as_i64() {
        PropertyValue::Int(i)
    } else if let Some(f) = n.as_f64() {
        PropertyValue::Float(f)
    } else {
        PropertyValue::Text(n.to_string())
    }
}
