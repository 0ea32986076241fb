use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

fn temp_path(label: &str) -> PathBuf {
    let pid = std::process::id();
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("collmerge_{label}_{pid}_{nanos}.json"))
}

#[test]
fn tidy_rewrites_in_place() {
    let path = temp_path("tidy");
    std::fs::write(
        &path,
        r#"{"info": {"name": "c", "_postman_id": "abc"}, "item": [{"name": "r", "id": "1", "request": {"method": "GET", "url": "x", "auth": null}}]}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("collmerge");
    cmd.args(["tidy", path.to_str().unwrap()]);
    cmd.assert().success().stdout(predicate::str::starts_with("Tidied "));

    let out: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        out,
        serde_json::json!({"info": {"name": "c"}, "item": [{"name": "r", "request": {"method": "GET", "url": "x"}}]})
    );

    let _ = std::fs::remove_file(&path);
}

#[test]
fn tidy_rejects_invalid_json() {
    let path = temp_path("tidy_bad");
    std::fs::write(&path, "{not json").unwrap();

    let mut cmd = cargo_bin_cmd!("collmerge");
    cmd.args(["tidy", path.to_str().unwrap()]);
    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Invalid JSON"));

    let _ = std::fs::remove_file(&path);
}

#[test]
fn restructure_nests_flat_folders_into_out_path() {
    let input = temp_path("flat");
    let out = temp_path("nested");
    std::fs::write(
        &input,
        r#"{"info": {"name": "c"}, "item": [{"name": "sites/{site Id}/views", "item": [{"name": "List views", "request": {"url": "{{u}}/views"}}]}]}"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("collmerge");
    cmd.args(["restructure", input.to_str().unwrap(), "--out", out.to_str().unwrap()]);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("Restructured 1 folder(s)"));

    let v: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(v["item"][0]["name"], "sites");
    assert_eq!(v["item"][0]["item"][0]["name"], "{siteId}");
    assert_eq!(v["item"][0]["item"][0]["item"][0]["name"], "views");
    assert_eq!(v["item"][0]["item"][0]["item"][0]["item"][0]["name"], "List views");

    let _ = std::fs::remove_file(&input);
    let _ = std::fs::remove_file(&out);
}
