mod test_support;

use serde_json::json;
use test_support::{request_err, request_ok, spawn_sidecar, temp_dir};

#[test]
fn customization_rejects_locked_or_excess_badges_and_keeps_record() {
    let workspace = temp_dir("reportcard-profile");
    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );

    let options = request_ok(&mut stdin, &mut reader, "2", "profile.options", json!({}));
    assert_eq!(options["avatars"].as_array().map(|a| a.len()), Some(12));
    assert_eq!(options["profileColors"].as_array().map(|a| a.len()), Some(8));
    assert_eq!(options["maxVisibleBadges"], json!(3));
    assert_eq!(options["unlockedBadges"].as_array().map(|a| a.len()), Some(5));

    let before = request_ok(&mut stdin, &mut reader, "3", "record.get", json!({}));

    let locked = request_err(
        &mut stdin,
        &mut reader,
        "4",
        "profile.customize",
        json!({ "visibleBadges": ["💎"] }),
    );
    assert_eq!(locked["code"], json!("bad_params"));

    let too_many = request_err(
        &mut stdin,
        &mut reader,
        "5",
        "profile.customize",
        json!({ "visibleBadges": ["🏅", "💯", "⚡", "🧠"] }),
    );
    assert_eq!(too_many["code"], json!("bad_params"));

    let bad_color = request_err(
        &mut stdin,
        &mut reader,
        "6",
        "profile.customize",
        json!({ "profileColor": "#000000" }),
    );
    assert_eq!(bad_color["code"], json!("bad_params"));

    let wrong_type = request_err(
        &mut stdin,
        &mut reader,
        "7",
        "profile.customize",
        json!({ "visibleBadges": "🏅" }),
    );
    assert_eq!(wrong_type["code"], json!("bad_params"));

    let after = request_ok(&mut stdin, &mut reader, "8", "record.get", json!({}));
    assert_eq!(after, before);

    let badges = request_ok(&mut stdin, &mut reader, "9", "badges.list", json!({}));
    let visible: Vec<&str> = badges["badges"]
        .as_array()
        .expect("badges")
        .iter()
        .filter(|b| b["visible"] == json!(true))
        .filter_map(|b| b["emoji"].as_str())
        .collect();
    assert_eq!(visible, vec!["🏅", "💯", "⚡"]);
}

#[test]
fn theme_choice_persists_and_unknown_theme_is_rejected() {
    let workspace = temp_dir("reportcard-theme");
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        let _ = request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let set = request_ok(&mut stdin, &mut reader, "2", "theme.set", json!({ "theme": "neon" }));
        assert_eq!(set["theme"]["isDark"], json!(true));
        let bad = request_err(&mut stdin, &mut reader, "3", "theme.set", json!({ "theme": "sepia" }));
        assert_eq!(bad["code"], json!("bad_params"));
        drop(stdin);
        let _ = child.wait();
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let theme = request_ok(&mut stdin, &mut reader, "5", "theme.get", json!({}));
    assert_eq!(theme["theme"]["id"], json!("neon"));
}
