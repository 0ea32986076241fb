//! Parsing and writing collection JSON with actionable diagnostics.
//!
//! serde's "missing field" and "invalid type" messages point at a column, not
//! at what the user got wrong. These helpers keep parsing strict while naming
//! the required top-level fields.

use std::fmt;

use collmerge_core::model::Collection;
use log::warn;
use serde::Serialize;
use serde::de::Error as _;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;

use crate::version::is_supported_schema;

const REQUIRED_TOP_LEVEL_FIELDS: &[&str] = &["info", "item"];

/// A structured error for parsing a collection JSON payload.
#[derive(Debug)]
pub enum CollectionJsonError {
    /// The input was not valid JSON.
    InvalidJson(serde_json::Error),
    /// The input JSON was valid, but missing required top-level fields.
    MissingRequiredTopLevelFields {
        missing: Vec<&'static str>,
        required: Vec<&'static str>,
    },
    /// JSON was valid, but did not match the collection shape.
    InvalidCollectionShape(serde_json::Error),
}

impl CollectionJsonError {
    pub const fn code(&self) -> &'static str {
        match self {
            CollectionJsonError::InvalidJson(_) => "invalid_json",
            CollectionJsonError::MissingRequiredTopLevelFields { .. } => "missing_required_fields",
            CollectionJsonError::InvalidCollectionShape(_) => "invalid_collection_shape",
        }
    }
}

impl fmt::Display for CollectionJsonError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionJsonError::InvalidJson(e) => {
                write!(f, "Invalid JSON: {e}")
            }
            CollectionJsonError::MissingRequiredTopLevelFields { missing, required } => {
                write!(
                    f,
                    "Invalid collection JSON: missing required top-level field(s): {}. Required top-level fields: {}.",
                    missing.join(", "),
                    required.join(", ")
                )
            }
            CollectionJsonError::InvalidCollectionShape(e) => {
                write!(
                    f,
                    "Invalid collection JSON shape: {e}. Required top-level fields: {}.",
                    REQUIRED_TOP_LEVEL_FIELDS.join(", ")
                )
            }
        }
    }
}

impl std::error::Error for CollectionJsonError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CollectionJsonError::InvalidJson(e) => Some(e),
            CollectionJsonError::InvalidCollectionShape(e) => Some(e),
            CollectionJsonError::MissingRequiredTopLevelFields { .. } => None,
        }
    }
}

/// Parse a collection JSON object, keeping unrecognized nodes as opaque.
///
/// Fails only when the document is not JSON, is not an object, lacks `info`
/// or `item`, or when `item` is not an array.
pub fn parse_collection_json_str(s: &str) -> Result<Collection, CollectionJsonError> {
    let v: Value = serde_json::from_str(s).map_err(CollectionJsonError::InvalidJson)?;
    parse_collection_value(v)
}

pub fn parse_collection_value(v: Value) -> Result<Collection, CollectionJsonError> {
    let obj = v.as_object().ok_or_else(|| {
        CollectionJsonError::InvalidCollectionShape(serde_json::Error::custom("expected a JSON object"))
    })?;

    let missing: Vec<&'static str> = REQUIRED_TOP_LEVEL_FIELDS
        .iter()
        .copied()
        .filter(|k| !obj.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(CollectionJsonError::MissingRequiredTopLevelFields {
            missing,
            required: REQUIRED_TOP_LEVEL_FIELDS.to_vec(),
        });
    }
    if !obj.get("item").is_some_and(Value::is_array) {
        return Err(CollectionJsonError::InvalidCollectionShape(serde_json::Error::custom(
            "`item` must be an array",
        )));
    }

    let collection: Collection =
        serde_json::from_value(v).map_err(CollectionJsonError::InvalidCollectionShape)?;

    if let Some(schema) = collection.info.extra.get("schema").and_then(Value::as_str) {
        if !is_supported_schema(schema) {
            warn!("unrecognized collection schema '{schema}'; continuing");
        }
    }
    Ok(collection)
}

/// Pretty JSON with four-space indentation and a trailing newline.
pub fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut ser)?;
    out.push(b'\n');
    Ok(String::from_utf8_lossy(&out).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_are_named() {
        let err = parse_collection_json_str(r#"{"info": {}}"#).unwrap_err();
        assert_eq!(err.code(), "missing_required_fields");
        assert!(err.to_string().contains("missing required top-level field(s): item"));
    }

    #[test]
    fn non_array_item_is_a_shape_error() {
        let err = parse_collection_json_str(r#"{"info": {}, "item": {}}"#).unwrap_err();
        assert!(matches!(err, CollectionJsonError::InvalidCollectionShape(_)));
    }

    #[test]
    fn pretty_json_uses_four_spaces() {
        let s = to_pretty_json(&serde_json::json!({"a": [1]})).unwrap();
        assert_eq!(s, "{\n    \"a\": [\n        1\n    ]\n}\n");
    }
}
