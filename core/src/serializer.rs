//! JSON encoding and decoding of property bags.
//!
//! Mutating calls frequently come back with no body at all, so an absent,
//! empty, or `null` body decodes to an empty mapping. A body that is present
//! but not well-formed JSON is still an error.

use serde::de::Error as _;
use serde_json::{Map, Value};

/// Converts between JSON text and property mappings.
pub trait Serializer: Send + Sync {
    /// Decode a body that should hold a single JSON object.
    fn decode(&self, body: Option<&str>) -> Result<Map<String, Value>, serde_json::Error>;

    /// Decode a body that should hold a JSON array of objects.
    fn decode_array(&self, body: Option<&str>) -> Result<Vec<Map<String, Value>>, serde_json::Error>;

    fn encode(&self, value: &Value) -> Result<String, serde_json::Error>;
}

/// The default `serde_json` serializer. Key order is preserved.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl JsonSerializer {
    fn parse(body: Option<&str>) -> Result<Value, serde_json::Error> {
        match body.map(str::trim) {
            None | Some("") => Ok(Value::Null),
            Some(text) => serde_json::from_str(text),
        }
    }
}

impl Serializer for JsonSerializer {
    fn decode(&self, body: Option<&str>) -> Result<Map<String, Value>, serde_json::Error> {
        match Self::parse(body)? {
            Value::Null => Ok(Map::new()),
            Value::Object(map) => Ok(map),
            other => Err(serde_json::Error::custom(format!(
                "expected a JSON object, found {}",
                kind(&other)
            ))),
        }
    }

    fn decode_array(&self, body: Option<&str>) -> Result<Vec<Map<String, Value>>, serde_json::Error> {
        match Self::parse(body)? {
            Value::Null => Ok(Vec::new()),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::Null => Ok(Map::new()),
                    Value::Object(map) => Ok(map),
                    other => Err(serde_json::Error::custom(format!(
                        "expected an array of JSON objects, found an element that is {}",
                        kind(&other)
                    ))),
                })
                .collect(),
            other => Err(serde_json::Error::custom(format!(
                "expected a JSON array, found {}",
                kind(&other)
            ))),
        }
    }

    fn encode(&self, value: &Value) -> Result<String, serde_json::Error> {
        serde_json::to_string(value)
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
