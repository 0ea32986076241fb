use collmerge_core::model::{Collection, Item, RequestItem};
use collmerge_merge::walk::walk_requests;
use collmerge_merge::{MergeConfig, ServiceConfig};
use serde_json::{json, Value};

pub fn collection(items: Value) -> Collection {
    serde_json::from_value(json!({
        "info": { "name": "test" },
        "item": items
    }))
    .expect("test collection must deserialize")
}

pub fn request(name: &str, method: &str, path: &[&str]) -> Value {
    json!({
        "name": name,
        "request": {
            "method": method,
            "url": {
                "raw": format!("{{{{baseUrl}}}}/{}", path.join("/")),
                "host": ["{{baseUrl}}"],
                "path": path
            }
        }
    })
}

pub fn folder(name: &str, items: Value) -> Value {
    json!({ "name": name, "item": items })
}

#[allow(dead_code)]
pub fn single_service(name: &str, working_folder: Option<&str>) -> MergeConfig {
    let mut svc = ServiceConfig::new(name);
    svc.working_folder = working_folder.map(|p| collmerge_merge::FolderPath::Joined(p.to_string()));
    MergeConfig {
        services: vec![svc],
        ..MergeConfig::default()
    }
}

/// Every request in the tree (retired subtrees included) with its folder trail.
#[allow(dead_code)]
pub fn requests_with_trails(items: &[Item]) -> Vec<(Vec<String>, RequestItem)> {
    let mut out = Vec::new();
    walk_requests(items, true, |req, _path, trail, _retired| {
        out.push((trail.to_vec(), req.clone()));
    });
    out
}

#[allow(dead_code)]
pub fn trails_of(items: &[Item], name: &str) -> Vec<Vec<String>> {
    requests_with_trails(items)
        .into_iter()
        .filter(|(_, r)| r.name == name)
        .map(|(t, _)| t)
        .collect()
}
