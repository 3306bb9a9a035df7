mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, spawn_sidecar_with, temp_dir};

#[test]
fn prompt_is_composed_from_record() {
    let workspace = temp_dir("reportcard-prompt");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let prompt = request_ok(&mut stdin, &mut reader, "2", "ai.narrative.prompt", json!({}));
    let text = prompt["prompt"].as_str().expect("prompt text");
    assert!(text.contains("نام دانش‌آموز: حسین ذاکری"));
    assert!(text.contains("ضعیف‌ترین دروس: تاریخ و جغرافیا (تراز: 6169)، اقتصاد (تراز: 8707)"));
}

#[test]
fn missing_api_key_fails_generation_as_retryable() {
    let workspace = temp_dir("reportcard-ai-nokey");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let idle = request_ok(&mut stdin, &mut reader, "2", "ai.narrative.get", json!({}));
    assert_eq!(idle["narrative"]["state"], json!("idle"));

    let failed = request_err(&mut stdin, &mut reader, "3", "ai.narrative.generate", json!({}));
    assert_eq!(failed["code"], json!("ai_failed"));
    assert_eq!(failed["details"]["retryable"], json!(true));

    let state = request_ok(&mut stdin, &mut reader, "4", "ai.narrative.get", json!({}));
    assert_eq!(state["narrative"]["state"], json!("failed"));
    assert_eq!(state["narrative"]["loading"], json!(false));
    assert!(state["narrative"]["text"].is_null());
    assert!(state["narrative"]["error"].is_string());
}

#[test]
fn unreachable_service_fails_generation_and_allows_retry() {
    let workspace = temp_dir("reportcard-ai-unreachable");
    let (_child, mut stdin, mut reader) = spawn_sidecar_with(&[
        ("REPORTCARD_AI_ENDPOINT", "http://127.0.0.1:9/v1beta/models/test:generateContent"),
        ("REPORTCARD_AI_API_KEY", "test-key"),
    ]);
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let first = request_err(&mut stdin, &mut reader, "2", "ai.narrative.generate", json!({}));
    assert_eq!(first["code"], json!("ai_failed"));
    let first_id = first["details"]["narrative"]["generationId"].clone();

    let second = request_err(&mut stdin, &mut reader, "3", "ai.narrative.generate", json!({}));
    assert_eq!(second["code"], json!("ai_failed"));
    assert_ne!(second["details"]["narrative"]["generationId"], first_id);
    assert!(!second["details"]["cause"]
        .as_str()
        .unwrap_or("")
        .contains("test-key"));
}
