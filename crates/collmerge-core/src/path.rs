//! Canonical path keys for request addresses.
//!
//! A normalized path is slash-joined with:
//! - no leading slash
//! - no scheme, host, query string or fragment
//! - every placeholder segment (`{{x}}` or `:x`) collapsed to [`PARAM_TOKEN`]
//!
//! so a curated collection using `{{tenantId}}` and a generated one using
//! `:tenantId` produce the same key for the same endpoint.

use std::fmt;

use crate::model::{split_address, Request, Segments, Url, UrlObject};
use crate::vars::is_placeholder_segment;

/// Canonical token every placeholder segment collapses to.
pub const PARAM_TOKEN: &str = ":param";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath(String);

impl NormalizedPath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }
}

impl fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why no path key could be derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizationError {
    /// The request has no URL at all.
    MissingUrl,
    /// The URL resolved to zero path segments.
    EmptyPath,
    /// The URL is neither a string nor a recognizable object.
    UnsupportedShape,
}

impl NormalizationError {
    pub const fn code(self) -> &'static str {
        match self {
            NormalizationError::MissingUrl => "missing_url",
            NormalizationError::EmptyPath => "empty_path",
            NormalizationError::UnsupportedShape => "unsupported_url_shape",
        }
    }
}

impl fmt::Display for NormalizationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizationError::MissingUrl => write!(f, "request has no url"),
            NormalizationError::EmptyPath => write!(f, "url has an empty path"),
            NormalizationError::UnsupportedShape => write!(f, "url has an unsupported shape"),
        }
    }
}

impl std::error::Error for NormalizationError {}

/// Normalize the URL of a request.
pub fn normalize_request(req: &Request) -> Result<NormalizedPath, NormalizationError> {
    let url = req.url.as_ref().ok_or(NormalizationError::MissingUrl)?;
    normalize_url(url)
}

pub fn normalize_url(url: &Url) -> Result<NormalizedPath, NormalizationError> {
    match url {
        Url::Raw(s) => normalize_str(s),
        Url::Structured(o) => normalize_structured(o),
        Url::Other(_) => Err(NormalizationError::UnsupportedShape),
    }
}

/// Structured form: the path segment list wins over the raw field, since it
/// carries no scheme, host or query noise.
pub fn normalize_structured(url: &UrlObject) -> Result<NormalizedPath, NormalizationError> {
    match &url.path {
        Some(Segments::List(segments)) if segments.iter().any(|s| !s.is_empty()) => {
            from_segments(segments.iter().map(String::as_str))
        }
        Some(Segments::Joined(p)) if !p.trim().is_empty() => normalize_path_str(p),
        _ => match url.raw.as_deref() {
            Some(raw) => normalize_str(raw),
            None => Err(NormalizationError::EmptyPath),
        },
    }
}

/// String form: a full or relative address.
///
/// Scheme, host and port are cut by [`split_address`], the same splitter used
/// to parse string URLs into structured ones, so both forms key alike.
pub fn normalize_str(raw: &str) -> Result<NormalizedPath, NormalizationError> {
    from_segments(split_address(raw).path.split('/'))
}

fn normalize_path_str(path: &str) -> Result<NormalizedPath, NormalizationError> {
    from_segments(strip_query(path).split('/'))
}

fn strip_query(s: &str) -> &str {
    let end = s.find(['?', '#']).unwrap_or(s.len());
    &s[..end]
}

fn from_segments<'a>(
    segments: impl Iterator<Item = &'a str>,
) -> Result<NormalizedPath, NormalizationError> {
    let parts: Vec<&str> = segments
        .filter(|s| !s.is_empty())
        .map(|s| if is_placeholder_segment(s) { PARAM_TOKEN } else { s })
        .collect();

    if parts.is_empty() {
        return Err(NormalizationError::EmptyPath);
    }
    Ok(NormalizedPath(parts.join("/")))
}
