//! Deterministic JSON canonicalization.
//!
//! Stable bytes for fingerprints, independent of the key order a curated
//! collection happens to be stored in:
//! - object keys are sorted lexicographically
//! - arrays preserve order
//! - output is minified JSON with no extra whitespace

use serde::Serialize;
use serde_json::{Map, Value};

/// Convert a serializable value to canonical JSON bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, serde_json::Error> {
    let canon = to_canonical_value(value)?;
    let mut out = Vec::new();
    serde_json::to_writer(&mut out, &canon)?;
    Ok(out)
}

/// Convert a serializable value to a canonical JSON string.
pub fn to_canonical_json_string<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let bytes = to_canonical_json_bytes(value)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Serialize and deep-sort object keys.
pub fn to_canonical_value<T: Serialize>(value: &T) -> Result<Value, serde_json::Error> {
    Ok(canonicalize(serde_json::to_value(value)?))
}

fn canonicalize(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            // Insertion order is the output order under `preserve_order`.
            let mut sorted = Map::with_capacity(entries.len());
            for (k, v) in entries {
                sorted.insert(k, canonicalize(v));
            }
            Value::Object(sorted)
        }
        Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
