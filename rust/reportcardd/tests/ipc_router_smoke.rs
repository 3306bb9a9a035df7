mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, send_line, spawn_sidecar, temp_dir};

#[test]
fn health_reports_version_before_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let health = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    assert_eq!(
        health.get("version").and_then(|v| v.as_str()),
        Some(env!("CARGO_PKG_VERSION"))
    );
    assert!(health.get("workspacePath").map(|v| v.is_null()).unwrap_or(false));
}

#[test]
fn malformed_line_and_unknown_method_are_reported() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let bad = send_line(&mut stdin, &mut reader, "{not json");
    assert_eq!(bad["ok"], json!(false));
    assert_eq!(bad["error"]["code"], json!("bad_json"));

    let unknown = request_err(&mut stdin, &mut reader, "2", "grades.list", json!({}));
    assert_eq!(unknown["code"], json!("not_implemented"));

    // The loop keeps serving after errors.
    let _ = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
}

#[test]
fn record_methods_need_a_workspace() {
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    for (i, method) in ["record.get", "metrics.summary", "theme.get", "ai.narrative.prompt"]
        .iter()
        .enumerate()
    {
        let e = request_err(&mut stdin, &mut reader, &i.to_string(), method, json!({}));
        assert_eq!(e["code"], json!("no_workspace"), "{}", method);
    }

    let themes = request_ok(&mut stdin, &mut reader, "10", "theme.list", json!({}));
    assert_eq!(themes["themes"].as_array().map(|a| a.len()), Some(4));
    let badges = request_ok(&mut stdin, &mut reader, "11", "badges.list", json!({}));
    assert_eq!(badges["badges"].as_array().map(|a| a.len()), Some(15));
    assert!(badges["badges"][0]["unlocked"].is_null());
}

#[test]
fn workspace_select_seeds_and_reports_alignment() {
    let workspace = temp_dir("reportcard-smoke");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    let missing = request_err(&mut stdin, &mut reader, "1", "workspace.select", json!({}));
    assert_eq!(missing["code"], json!("bad_params"));

    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["recordSource"], json!("seeded"));
    assert_eq!(selected["theme"], json!("light"));
    // Seed subjects carry five history points against three completed exams.
    assert_eq!(selected["alignment"].as_array().map(|a| a.len()), Some(8));
    assert!(workspace.join("reportcard.sqlite3").is_file());
}
