//! Deterministic clean-up of a collection document.
//!
//! Works on the raw JSON value so that it applies to any collection,
//! including nodes the typed model keeps opaque.

use std::cmp::Ordering;

use collmerge_core::model::STATUS_KEY;
use serde_json::{Map, Value};

/// Parent keys under which an object's `id` is volatile.
const VOLATILE_ID_PARENTS: &[&str] = &["item", "response", "event"];

pub fn tidy_collection(value: &mut Value) {
    tidy_node(value, "");
}

fn tidy_node(node: &mut Value, parent_key: &str) {
    match node {
        Value::Array(items) => {
            for v in items.iter_mut() {
                tidy_node(v, parent_key);
            }
        }
        Value::Object(obj) => {
            tidy_object(obj, parent_key);
            for (k, v) in obj.iter_mut() {
                if v.is_object() || v.is_array() {
                    tidy_node(v, k);
                }
            }
        }
        _ => {}
    }
}

fn tidy_object(obj: &mut Map<String, Value>, parent_key: &str) {
    let collapsed = obj
        .get("description")
        .and_then(description_text)
        .map(str::to_string);
    match collapsed {
        Some(s) if s.is_empty() => {
            obj.shift_remove("description");
        }
        Some(s) => {
            obj.insert("description".to_string(), Value::String(s));
        }
        None => {}
    }

    if VOLATILE_ID_PARENTS.contains(&parent_key) {
        obj.shift_remove("id");
    }
    if let Some(Value::Object(info)) = obj.get_mut("info") {
        info.shift_remove("_postman_id");
    }

    if let Some(Value::Object(request)) = obj.get_mut("request") {
        tidy_request(request);
    }

    if let Some(Value::Object(behavior)) = obj.get("protocolProfileBehavior") {
        let kept: Map<String, Value> = behavior
            .iter()
            .filter(|(k, _)| k.as_str() == STATUS_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if kept.is_empty() {
            obj.shift_remove("protocolProfileBehavior");
        } else {
            obj.insert("protocolProfileBehavior".to_string(), Value::Object(kept));
        }
    }
}

fn tidy_request(request: &mut Map<String, Value>) {
    request.shift_remove("name");

    if let Some(Value::Array(headers)) = request.get_mut("header") {
        headers.sort_by(by_key);
    }
    if matches!(request.get("auth"), Some(Value::Null)) {
        request.shift_remove("auth");
    }
    if matches!(request.get("body"), Some(Value::Object(b)) if b.is_empty()) {
        request.shift_remove("body");
    }

    if let Some(Value::Object(url)) = request.get_mut("url") {
        if let Some(Value::Array(query)) = url.get_mut("query") {
            query.sort_by(by_key);
        }
        let structured = url.get("path").is_some_and(Value::is_array)
            || url.get("host").is_some_and(Value::is_array);
        if structured {
            url.shift_remove("raw");
        }
    }
}

/// Text of a plain or wrapped (`content` / `raw`) description.
fn description_text(desc: &Value) -> Option<&str> {
    match desc {
        Value::String(s) => Some(s),
        Value::Object(o) => o
            .get("content")
            .and_then(Value::as_str)
            .or_else(|| o.get("raw").and_then(Value::as_str)),
        _ => None,
    }
}

fn by_key(a: &Value, b: &Value) -> Ordering {
    key_of(a).cmp(key_of(b))
}

fn key_of(v: &Value) -> &str {
    v.get("key").and_then(Value::as_str).unwrap_or("")
}
