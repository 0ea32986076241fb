//! Field-level merge of one matched request pair.
//!
//! The working request is mutated field by field; it is never replaced
//! wholesale. Per field:
//! - method: reference wins (uppercased), falls back to the working value
//! - url: see [`merge_url`]
//! - headers: reference list, keeping working `{{var}}` values for equal keys
//! - body: working raw bodies holding `{{var}}` are kept, otherwise reference
//! - description: working text above the delimiter, reference text below
//! - name: kept unless `keep_working_name` is off
//! - auth, events, responses, item extras: never touched
//!
//! Unexpected shapes never fail a merge; the field keeps its prior value.

use collmerge_core::identity::{operation_id, request_method};
use collmerge_core::model::{
    Body, Description, HeaderList, KeyValue, Request, RequestItem, Segments, Url, UrlObject,
};
use collmerge_core::path::{normalize_str, normalize_url};
use collmerge_core::vars::{contains_template, is_template_segment};
use log::warn;

#[derive(Debug, Clone, Copy)]
pub struct FieldPolicy<'a> {
    pub delimiter: &'a str,
    pub keep_working_name: bool,
    /// Keep the reference's `operationId:` marker in the merged description.
    pub keep_operation_marker: bool,
}

/// Merge `incoming` (reference) into `existing` (working) in place.
pub fn merge_request_item(existing: &mut RequestItem, incoming: &RequestItem, policy: &FieldPolicy<'_>) {
    merge_request(&mut existing.request, &incoming.request, policy.delimiter);
    if policy.keep_operation_marker {
        if let Some(id) = operation_id(&incoming.request) {
            keep_operation_marker(&mut existing.request, &id);
        }
    }

    if !policy.keep_working_name && !incoming.name.is_empty() {
        existing.name = incoming.name.clone();
    }
}

pub fn merge_request(existing: &mut Request, incoming: &Request, delimiter: &str) {
    existing.method = Some(merge_method(existing, incoming));
    existing.description = merge_description(
        existing.description.as_ref(),
        incoming.description.as_ref(),
        delimiter,
    );
    existing.header = merge_headers(existing.header.as_ref(), incoming.header.as_ref());
    existing.body = merge_body(existing.body.as_ref(), incoming.body.as_ref());
    existing.url = merge_url(existing.url.as_ref(), incoming.url.as_ref());
}

fn merge_method(existing: &Request, incoming: &Request) -> String {
    match incoming.method.as_deref().map(str::trim) {
        Some(m) if !m.is_empty() => m.to_uppercase(),
        _ => request_method(existing),
    }
}

/// Reference headers, sorted by key, with working `{{var}}` values kept for
/// keys present on both sides (case-insensitive).
pub fn merge_headers(existing: Option<&HeaderList>, incoming: Option<&HeaderList>) -> Option<HeaderList> {
    let reference = match incoming {
        None => return existing.cloned(),
        Some(HeaderList::Other(_)) => {
            warn!("reference headers are not a list; keeping working headers");
            return existing.cloned();
        }
        Some(HeaderList::List(l)) => l,
    };

    let working: &[KeyValue] = existing.and_then(HeaderList::as_list).unwrap_or(&[]);

    let mut merged: Vec<KeyValue> = reference
        .iter()
        .map(|h| {
            let key = h.key_str().to_lowercase();
            let preserved = working
                .iter()
                .rev()
                .find(|w| w.key_str().to_lowercase() == key)
                .filter(|w| w.value_str().is_some_and(contains_template));
            match preserved {
                Some(w) => KeyValue {
                    value: w.value.clone(),
                    ..h.clone()
                },
                None => h.clone(),
            }
        })
        .collect();

    merged.sort_by_cached_key(|h| h.key_str().to_lowercase());
    Some(HeaderList::List(merged))
}

/// Append an `operationId:` line when the merged description lost it, so the
/// request keeps the key it was matched on.
fn keep_operation_marker(req: &mut Request, id: &str) {
    if operation_id(req).as_deref() == Some(id) || matches!(req.description, Some(Description::Other(_))) {
        return;
    }
    let text = match req.description.as_ref().map(Description::text) {
        Some(t) if !t.trim().is_empty() => format!("{}\noperationId: {id}", t.trim_end()),
        _ => format!("operationId: {id}"),
    };
    req.description = Some(Description::shaped_like(req.description.as_ref(), text));
}

/// A working raw body that references a `{{var}}` is kept untouched.
pub fn merge_body(existing: Option<&Body>, incoming: Option<&Body>) -> Option<Body> {
    let keep = existing.is_some_and(|b| b.is_raw_mode() && b.raw_text().is_some_and(contains_template));
    if keep {
        return existing.cloned();
    }
    incoming.or(existing).cloned()
}

/// Combine working notes (before the delimiter) with the reference's
/// generated text (after it), keeping the working value's shape.
pub fn merge_description(
    existing: Option<&Description>,
    incoming: Option<&Description>,
    delimiter: &str,
) -> Option<Description> {
    if matches!(existing, Some(Description::Other(_))) || matches!(incoming, Some(Description::Other(_))) {
        warn!("description has an unsupported shape; keeping working description");
        return existing.cloned();
    }

    let working = existing.map(Description::text).unwrap_or("");
    let reference = incoming.map(Description::text).unwrap_or("");
    let merged = merge_description_text(working, reference, delimiter);

    if merged.is_empty() && existing.is_none() {
        return None;
    }
    Some(Description::shaped_like(existing, merged))
}

pub fn merge_description_text(working: &str, reference: &str, delimiter: &str) -> String {
    let tail = match reference.split_once(delimiter) {
        Some((_, t)) => t,
        None => reference,
    };
    let tail = if tail.trim().is_empty() { "" } else { tail };

    let head = match working.split_once(delimiter) {
        Some((h, _)) => h,
        // An earlier merge wrote the generated text alone; it is not a note.
        None if !tail.is_empty() && working.trim() == tail.trim() => "",
        None => working,
    };
    let head = if head.trim().is_empty() { "" } else { head };

    match (head.is_empty(), tail.is_empty()) {
        (false, false) => format!("{head}{delimiter}{tail}"),
        (false, true) => head.to_string(),
        (true, false) => tail.to_string(),
        (true, true) => String::new(),
    }
}

/// Merge a reference URL into a working URL.
///
/// 1. No working URL: adopt the reference.
/// 2. Working string: kept verbatim when both normalize to the same path,
///    otherwise replaced by the reference's string form.
/// 3. Working object: see [`merge_structured_url`].
pub fn merge_url(existing: Option<&Url>, incoming: Option<&Url>) -> Option<Url> {
    let incoming = match incoming {
        None => return existing.cloned(),
        Some(Url::Other(_)) => {
            warn!("reference url has an unsupported shape; keeping working url");
            return existing.cloned();
        }
        Some(u) => u,
    };
    let Some(existing) = existing else {
        return Some(incoming.clone());
    };

    match existing {
        Url::Raw(old) => {
            let have = normalize_str(old).ok();
            let want = normalize_url(incoming).ok();
            if have.is_some() && have == want {
                Some(existing.clone())
            } else {
                Some(Url::Raw(incoming.to_display_string()))
            }
        }
        Url::Structured(old) => match incoming.to_structured() {
            Some(new) => Some(Url::Structured(merge_structured_url(old, &new))),
            None => Some(existing.clone()),
        },
        Url::Other(_) => {
            warn!("working url has an unsupported shape; leaving it untouched");
            Some(existing.clone())
        }
    }
}

/// Update a structured working URL from a structured reference URL.
///
/// - path: reference segments, except where the working segment at the same
///   position is a `{{var}}`, which is kept
/// - host: reference host (with its protocol and port), unless the working
///   host uses a `{{var}}`
/// - query, variable: reference lists, sorted by key
/// - raw: recomposed only when the working URL already had one
pub fn merge_structured_url(old: &UrlObject, new: &UrlObject) -> UrlObject {
    // A raw-only working URL is split first so its host survives.
    let old = &old.expanded();
    let mut out = old.clone();

    if let Some(new_path) = &new.path {
        let old_segments = old.path.as_ref().map(segment_list).unwrap_or_default();
        let merged: Vec<String> = segment_list(new_path)
            .into_iter()
            .enumerate()
            .map(|(i, seg)| match old_segments.get(i) {
                Some(o) if is_template_segment(o) => o.clone(),
                _ => seg,
            })
            .collect();

        out.path = Some(match &old.path {
            Some(Segments::Joined(_)) => Segments::Joined(merged.join("/")),
            _ => Segments::List(merged),
        });
    }

    let old_host_has_vars = old
        .host
        .as_ref()
        .is_some_and(|h| h.pieces().into_iter().any(contains_template));
    let new_host_present = new
        .host
        .as_ref()
        .is_some_and(|h| h.pieces().into_iter().any(|p| !p.is_empty()));
    if !old_host_has_vars && new_host_present {
        out.host = new.host.clone();
        if new.protocol.is_some() {
            out.protocol = new.protocol.clone();
        }
        match new.extra.get("port") {
            Some(port) => out.extra.insert("port".to_string(), port.clone()),
            None => out.extra.shift_remove("port"),
        };
    }

    if let Some(query) = &new.query {
        out.query = Some(sorted_by_key(query));
    }
    if let Some(variable) = &new.variable {
        out.variable = Some(sorted_by_key(variable));
    }

    if out.raw.is_some() {
        out.raw = Some(out.compose_raw());
    }

    out
}

fn segment_list(segments: &Segments) -> Vec<String> {
    match segments {
        Segments::List(l) => l.clone(),
        Segments::Joined(s) => s
            .split('/')
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect(),
    }
}

fn sorted_by_key(entries: &[KeyValue]) -> Vec<KeyValue> {
    let mut out = entries.to_vec();
    out.sort_by(|a, b| a.key_str().cmp(b.key_str()));
    out
}
