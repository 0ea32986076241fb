mod common;

use std::collections::BTreeMap;

use collmerge_merge::{reconcile, RetireMode};
use proptest::prelude::*;
use serde_json::{json, Value};

use common::{collection, folder, request, single_service};

const ENDPOINTS: &[(&str, &[&str])] = &[
    ("GET", &["api", "v1", "sites"]),
    ("POST", &["api", "v1", "sites"]),
    ("GET", &["api", "v1", "sites", ":siteId"]),
    ("DELETE", &["api", "v1", "sites", "{{siteId}}"]),
    ("GET", &["api", "v1", "tenants"]),
    ("PUT", &["api", "v1", "tenants", ":tenantId", "settings"]),
    ("GET", &["health"]),
];

const FOLDERS: &[&str] = &["Sites", "Tenants", "Misc"];

/// How an endpoint's address is written.
#[derive(Debug, Clone, Copy)]
enum UrlShape {
    /// `{raw, host: ["{{baseUrl}}"], path}`
    Structured,
    /// `"{{baseUrl}}/api/..."`
    TemplatedString,
    /// `"api/..."`
    BareString,
    /// `{raw: "localhost:3000/api/..."}`
    RawOnly,
}

/// Working-side description of an endpoint.
#[derive(Debug, Clone, Copy)]
enum Notes {
    None,
    Plain,
    /// Notes above the delimiter, operation marker below it.
    MarkerBelow,
    MarkerOnly,
}

#[derive(Debug, Clone, Copy)]
struct Pick {
    endpoint: usize,
    folder: Option<usize>,
    shape: UrlShape,
    notes: Notes,
}

fn url(shape: UrlShape, path: &[&str]) -> Value {
    let joined = path.join("/");
    match shape {
        UrlShape::Structured => json!({
            "raw": format!("{{{{baseUrl}}}}/{joined}"),
            "host": ["{{baseUrl}}"],
            "path": path
        }),
        UrlShape::TemplatedString => json!(format!("{{{{baseUrl}}}}/{joined}")),
        UrlShape::BareString => json!(joined),
        UrlShape::RawOnly => json!({ "raw": format!("localhost:3000/{joined}") }),
    }
}

fn working_endpoint(p: &Pick) -> Value {
    let (method, path) = ENDPOINTS[p.endpoint];
    let mut v = request(&format!("endpoint {}", p.endpoint), method, path);
    v["request"]["url"] = url(p.shape, path);
    let i = p.endpoint;
    let notes = match p.notes {
        Notes::None => return v,
        Notes::Plain => format!("notes {i}"),
        Notes::MarkerBelow => format!("notes {i}\n---\noperationId: op{i}"),
        Notes::MarkerOnly => format!("operationId: op{i}"),
    };
    v["request"]["description"] = json!(notes);
    v
}

fn reference_endpoint(p: &Pick) -> Value {
    let (method, path) = ENDPOINTS[p.endpoint];
    let i = p.endpoint;
    let mut v = request(&format!("generated {i}"), method, path);
    v["request"]["url"] = url(p.shape, path);
    v["request"]["description"] = json!(format!("operationId: op{i}\n---\nGenerated {i}."));
    v
}

/// Endpoints spread over optional subfolders, in the given order.
fn tree(picks: &[Pick], render: fn(&Pick) -> Value) -> Vec<Value> {
    let mut root: Vec<Value> = Vec::new();
    let mut folders: BTreeMap<usize, Vec<Value>> = BTreeMap::new();
    for p in picks {
        match p.folder {
            Some(f) => folders.entry(f).or_default().push(render(p)),
            None => root.push(render(p)),
        }
    }
    for (f, items) in folders {
        root.push(folder(FOLDERS[f], Value::Array(items)));
    }
    root
}

fn shape() -> impl Strategy<Value = UrlShape> {
    prop_oneof![
        Just(UrlShape::Structured),
        Just(UrlShape::TemplatedString),
        Just(UrlShape::BareString),
        Just(UrlShape::RawOnly),
    ]
}

fn notes() -> impl Strategy<Value = Notes> {
    prop_oneof![
        Just(Notes::None),
        Just(Notes::Plain),
        Just(Notes::MarkerBelow),
        Just(Notes::MarkerOnly),
    ]
}

fn picks() -> impl Strategy<Value = Vec<Pick>> {
    proptest::sample::subsequence((0..ENDPOINTS.len()).collect::<Vec<_>>(), 0..=ENDPOINTS.len())
        .prop_flat_map(|eps| {
            let n = eps.len();
            (
                Just(eps),
                prop::collection::vec((prop::option::of(0..FOLDERS.len()), shape(), notes()), n),
            )
        })
        .prop_map(|(eps, rest)| {
            eps.into_iter()
                .zip(rest)
                .map(|(endpoint, (folder, shape, notes))| Pick {
                    endpoint,
                    folder,
                    shape,
                    notes,
                })
                .collect()
        })
}

fn retire_mode() -> impl Strategy<Value = RetireMode> {
    prop_oneof![Just(RetireMode::Move), Just(RetireMode::Skip), Just(RetireMode::Delete)]
}

proptest! {
    #[test]
    fn a_settled_merge_is_a_fixed_point(
        working in picks(),
        reference in picks(),
        mode in retire_mode(),
        prefer_operation_id in any::<bool>(),
    ) {
        let mut working = collection(json!([folder(
            "Service",
            Value::Array(tree(&working, working_endpoint))
        )]));
        let reference = collection(Value::Array(tree(&reference, reference_endpoint)));
        let refs: BTreeMap<_, _> = [("svc".to_string(), reference)].into_iter().collect();

        let mut cfg = single_service("svc", Some("Service"));
        cfg.options.retire_mode = mode;
        cfg.options.prefer_operation_id = prefer_operation_id;

        let first = reconcile(&mut working, &refs, &cfg).unwrap();
        let settled = working.clone();
        let second = reconcile(&mut working, &refs, &cfg).unwrap();

        prop_assert_eq!(second.added, 0);
        prop_assert_eq!(second.retired, 0);
        prop_assert_eq!(second.updated, first.updated + first.added);
        // Fields are recomputed but reach the same values.
        prop_assert_eq!(&working, &settled);
    }

    #[test]
    fn matched_endpoints_are_never_retired_in_the_same_pass(
        picks in picks(),
        reference_shapes in prop::collection::vec(shape(), ENDPOINTS.len()),
        prefer_operation_id in any::<bool>(),
    ) {
        // Same endpoints on both sides, possibly written differently.
        let reference: Vec<Pick> = picks
            .iter()
            .map(|p| Pick { shape: reference_shapes[p.endpoint], notes: Notes::None, ..*p })
            .collect();
        let working: Vec<Pick> = picks
            .iter()
            .map(|p| Pick { notes: if prefer_operation_id { Notes::MarkerBelow } else { p.notes }, ..*p })
            .collect();

        let mut working = collection(json!([folder(
            "Service",
            Value::Array(tree(&working, working_endpoint))
        )]));
        let reference = collection(Value::Array(tree(&reference, reference_endpoint)));
        let refs: BTreeMap<_, _> = [("svc".to_string(), reference)].into_iter().collect();

        let mut cfg = single_service("svc", Some("Service"));
        cfg.options.prefer_operation_id = prefer_operation_id;

        let report = reconcile(&mut working, &refs, &cfg).unwrap();

        prop_assert_eq!(report.updated, picks.len());
        prop_assert_eq!(report.added, 0);
        prop_assert_eq!(report.retired, 0);
    }
}
