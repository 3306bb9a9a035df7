mod test_support;

use serde_json::json;
use test_support::{request_ok, spawn_sidecar, temp_dir};

fn select(
    stdin: &mut std::process::ChildStdin,
    reader: &mut std::io::BufReader<std::process::ChildStdout>,
    workspace: &std::path::Path,
) -> serde_json::Value {
    request_ok(
        stdin,
        reader,
        "select",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    )
}

#[test]
fn saved_record_restores_deep_equal_after_restart() {
    let workspace = temp_dir("reportcard-persist");

    let before = {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = select(&mut stdin, &mut reader, &workspace);
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "record.update",
            json!({ "patch": { "city": "تهران", "absenceCount": 4 } }),
        );
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "profile.customize",
            json!({ "avatar": "🧠", "visibleBadges": ["🎯", "🧠"], "profileColor": "#ec4899" }),
        );
        let record = request_ok(&mut stdin, &mut reader, "3", "record.get", json!({}));
        drop(stdin);
        let _ = child.wait();
        record["record"].clone()
    };

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = select(&mut stdin, &mut reader, &workspace);
    assert_eq!(selected["recordSource"], json!("restored"));
    let after = request_ok(&mut stdin, &mut reader, "4", "record.get", json!({}));
    assert_eq!(after["record"], before);
    assert_eq!(after["record"]["city"], json!("تهران"));
    assert_eq!(after["record"]["visibleBadges"], json!(["🎯", "🧠"]));
}

#[test]
fn corrupt_saved_record_falls_back_to_seed() {
    let workspace = temp_dir("reportcard-corrupt");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = select(&mut stdin, &mut reader, &workspace);
        drop(stdin);
        let _ = child.wait();
    }

    let conn = rusqlite::Connection::open(workspace.join("reportcard.sqlite3")).expect("open db");
    conn.execute(
        "UPDATE settings SET value_json = ? WHERE key = 'studentData'",
        ["{\"name\": 42"],
    )
    .expect("corrupt row");
    drop(conn);

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = select(&mut stdin, &mut reader, &workspace);
    assert_eq!(selected["recordSource"], json!("fallback"));
    let record = request_ok(&mut stdin, &mut reader, "1", "record.get", json!({}));
    assert_eq!(record["record"]["name"], json!("حسین ذاکری"));
    assert_eq!(record["record"]["totalTaz"], json!(9918));
}

#[test]
fn reset_restores_seed_and_validate_reports_candidate_errors() {
    let workspace = temp_dir("reportcard-reset");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = select(&mut stdin, &mut reader, &workspace);

    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "record.update",
        json!({ "patch": { "name": "مریم" } }),
    );
    let reset = request_ok(&mut stdin, &mut reader, "2", "record.reset", json!({}));
    assert_eq!(reset["record"]["name"], json!("حسین ذاکری"));

    let current = request_ok(&mut stdin, &mut reader, "3", "record.validate", json!({}));
    assert_eq!(current["valid"], json!(true));

    let mut candidate = reset["record"].clone();
    candidate["statusEmoji"] = json!("😞");
    let checked = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "record.validate",
        json!({ "record": candidate }),
    );
    assert_eq!(checked["valid"], json!(false));
    assert!(checked["error"].as_str().unwrap_or("").contains("status emoji"));
}
