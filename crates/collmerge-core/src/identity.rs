use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Request, RequestItem};
use crate::path::{normalize_request, NormalizationError, NormalizedPath};

/// Method assumed when a request does not declare one.
pub const DEFAULT_METHOD: &str = "GET";

static OPERATION_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*[*_]*operation[ _-]?id[*_]*\s*[:=]\s*`?([A-Za-z_][A-Za-z0-9_.\-]*)`?")
        .expect("valid operation id regex")
});

/// Identity of a logical endpoint across documents.
///
/// Two requests with equal keys are the same endpoint regardless of any
/// other field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityKey {
    /// `METHOD normalized/path`
    Endpoint { method: String, path: NormalizedPath },
    /// Operation identifier found in the request documentation.
    Operation(String),
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdentityKey::Endpoint { method, path } => write!(f, "{method} {path}"),
            IdentityKey::Operation(id) => write!(f, "operation:{id}"),
        }
    }
}

/// Uppercased method, defaulting to GET.
pub fn request_method(req: &Request) -> String {
    req.method
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_METHOD)
        .to_uppercase()
}

/// `METHOD path` key. Fails when no non-empty path can be derived.
pub fn endpoint_key(req: &Request) -> Result<IdentityKey, NormalizationError> {
    let path = normalize_request(req)?;
    Ok(IdentityKey::Endpoint {
        method: request_method(req),
        path,
    })
}

/// Resolve the identity key of a request.
///
/// With `prefer_operation_id`, an `operationId: <id>` marker in the request
/// description takes precedence over method and path. A request without a
/// usable path has no key either way.
pub fn identity_key(req: &Request, prefer_operation_id: bool) -> Result<IdentityKey, NormalizationError> {
    let endpoint = endpoint_key(req)?;
    if prefer_operation_id {
        if let Some(id) = operation_id(req) {
            return Ok(IdentityKey::Operation(id));
        }
    }
    Ok(endpoint)
}

pub fn item_key(item: &RequestItem, prefer_operation_id: bool) -> Result<IdentityKey, NormalizationError> {
    identity_key(&item.request, prefer_operation_id)
}

pub fn operation_id(req: &Request) -> Option<String> {
    req.description
        .as_ref()
        .and_then(|d| extract_operation_id(d.text()))
}

/// Find the first `operationId: <id>` marker line in documentation text.
pub fn extract_operation_id(text: &str) -> Option<String> {
    OPERATION_ID
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}
