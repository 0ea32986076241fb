use proptest::prelude::*;
use serde_json::json;

use collmerge_core::identity::{endpoint_key, identity_key, IdentityKey};
use collmerge_core::model::{Request, Url, UrlObject};
use collmerge_core::path::{normalize_str, normalize_structured, normalize_url, NormalizationError};

fn request(v: serde_json::Value) -> Request {
    serde_json::from_value(v).unwrap()
}

#[test]
fn string_and_structured_forms_share_a_key() {
    let structured = request(json!({
        "method": "get",
        "url": {
            "raw": "{{tcmBaseUrl}}/api/v1/tenants/{{tcmTenantId}}/sites/:siteId",
            "host": ["{{tcmBaseUrl}}"],
            "path": ["api", "v1", "tenants", "{{tcmTenantId}}", "sites", ":siteId"]
        }
    }));
    let string = request(json!({
        "method": "GET",
        "url": "https://example.com/api/v1/tenants/:tenantId/sites/{{site}}?expand=true"
    }));

    let a = endpoint_key(&structured).unwrap();
    let b = endpoint_key(&string).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_string(), "GET api/v1/tenants/:param/sites/:param");
}

#[test]
fn path_list_wins_over_raw() {
    let url: Url = serde_json::from_value(json!({
        "raw": "{{baseUrl}}/something/else",
        "path": ["api", "v1", "pat"]
    }))
    .unwrap();
    assert_eq!(normalize_url(&url).unwrap().as_str(), "api/v1/pat");
}

#[test]
fn raw_is_used_when_path_list_is_missing() {
    let url: Url = serde_json::from_value(json!({
        "raw": "http://localhost:8080/api/v1/pat?x=1"
    }))
    .unwrap();
    assert_eq!(normalize_url(&url).unwrap().as_str(), "api/v1/pat");
}

#[test]
fn missing_or_empty_urls_fail_explicitly() {
    assert_eq!(
        endpoint_key(&request(json!({ "method": "GET" }))),
        Err(NormalizationError::MissingUrl)
    );
    assert_eq!(
        endpoint_key(&request(json!({ "url": { "host": ["{{baseUrl}}"], "path": [] } }))),
        Err(NormalizationError::EmptyPath)
    );
    assert_eq!(
        endpoint_key(&request(json!({ "url": 42 }))),
        Err(NormalizationError::UnsupportedShape)
    );
}

#[test]
fn operation_id_preference_falls_back_to_endpoint() {
    let with_marker = request(json!({
        "method": "POST",
        "url": "{{baseUrl}}/api/v1/pat",
        "description": { "content": "Creates a token.\n---\noperationId: createPat", "type": "text/markdown" }
    }));
    assert_eq!(
        identity_key(&with_marker, true).unwrap(),
        IdentityKey::Operation("createPat".to_string())
    );
    assert_eq!(identity_key(&with_marker, false).unwrap().to_string(), "POST api/v1/pat");

    let without_marker = request(json!({ "url": "{{baseUrl}}/api/v1/pat" }));
    assert_eq!(identity_key(&without_marker, true).unwrap().to_string(), "GET api/v1/pat");
}

#[test]
fn operation_marker_without_url_has_no_key() {
    let req = request(json!({
        "method": "GET",
        "description": "operationId: orphanOp"
    }));
    assert_eq!(identity_key(&req, true), Err(NormalizationError::MissingUrl));
}

#[test]
fn string_reference_forms_match_structured_working() {
    let structured = request(json!({
        "method": "GET",
        "url": { "host": ["{{base}}"], "path": ["api", "v1", "x"] }
    }));
    let want = endpoint_key(&structured).unwrap();

    for url in [
        "api/v1/x",
        "/api/v1/x",
        "{{base}}/api/v1/x",
        "localhost:3000/api/v1/x",
        "{{host}}:8080/api/v1/x?q=1",
        "https://example.com:443/api/v1/x#top",
    ] {
        let string = request(json!({ "method": "GET", "url": url }));
        assert_eq!(endpoint_key(&string).unwrap(), want, "{url}");
    }
}

#[test]
fn parsed_string_url_keeps_the_keyed_path() {
    let parsed = UrlObject::parse_raw("api/v1/x");
    assert_eq!(parsed.host, None);
    assert_eq!(normalize_structured(&parsed).unwrap().as_str(), "api/v1/x");

    let parsed = UrlObject::parse_raw("localhost:3000/api/x");
    assert_eq!(parsed.extra.get("port"), Some(&json!("3000")));
    assert_eq!(normalize_structured(&parsed).unwrap().as_str(), "api/x");
}

fn segment() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9-]{0,8}"
}

proptest! {
    #[test]
    fn templating_convention_does_not_change_identity(
        segs in prop::collection::vec((segment(), any::<bool>()), 1..6),
        method in prop::sample::select(vec!["GET", "post", "Put", "DELETE"]),
    ) {
        // Same logical path: placeholders rendered as {{x}} in one form, :x in the other.
        let curly: Vec<String> = segs
            .iter()
            .map(|(s, var)| if *var { format!("{{{{{s}}}}}") } else { s.clone() })
            .collect();
        let colon: Vec<String> = segs
            .iter()
            .map(|(s, var)| if *var { format!(":{s}") } else { s.clone() })
            .collect();

        let structured = request(json!({
            "method": method,
            "url": { "host": ["{{baseUrl}}"], "path": curly }
        }));
        let string = request(json!({
            "method": method.to_lowercase(),
            "url": format!("{{{{baseUrl}}}}/{}", colon.join("/"))
        }));

        prop_assert_eq!(endpoint_key(&structured).unwrap(), endpoint_key(&string).unwrap());
    }

    #[test]
    fn string_url_keys_like_its_parsed_form(
        prefix in prop::sample::select(vec![
            "", "/", "{{baseUrl}}/", "localhost:3000/", "https://api.example.com/", "{{host}}:8080/",
        ]),
        segs in prop::collection::vec(segment(), 1..5),
        query in prop::sample::select(vec!["", "?a=1", "?a=1&b", "#frag"]),
    ) {
        let raw = format!("{prefix}{}{query}", segs.join("/"));
        let parsed = UrlObject::parse_raw(&raw);
        prop_assert_eq!(normalize_str(&raw).unwrap(), normalize_structured(&parsed).unwrap());
        let normalized = normalize_str(&raw).unwrap();
        prop_assert_eq!(normalized.as_str(), segs.join("/"));
    }
}
