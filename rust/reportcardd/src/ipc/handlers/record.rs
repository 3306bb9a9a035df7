use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{optional_str_list, record, store_err, workspace_mut};
use crate::ipc::types::{AppState, Request};
use crate::metrics;
use crate::model::{self, StudentRecord, AVATARS, BADGE_CATALOG, MAX_VISIBLE_BADGES, PROFILE_COLORS};
use crate::store::Customization;
use serde_json::{json, Value};

fn handle_record_get(state: &mut AppState, req: &Request) -> Value {
    match record(state, req) {
        Ok(r) => ok(&req.id, json!({ "record": r })),
        Err(e) => e,
    }
}

fn handle_record_update(state: &mut AppState, req: &Request) -> Value {
    let Some(patch) = req.params.get("patch").and_then(|v| v.as_object()) else {
        return err(&req.id, "bad_params", "params.patch must be an object", None);
    };
    let (conn, stores) = match workspace_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match stores.record.merge(conn, patch) {
        Ok(r) => ok(&req.id, json!({ "record": r })),
        Err(e) => store_err(req, e),
    }
}

fn handle_record_reset(state: &mut AppState, req: &Request) -> Value {
    let (conn, stores) = match workspace_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match stores.record.reset(conn) {
        Ok(r) => ok(&req.id, json!({ "record": r })),
        Err(e) => store_err(req, e),
    }
}

fn validation_report(candidate: &StudentRecord) -> Value {
    let alignment = metrics::history_alignment(&candidate.subjects, &candidate.exams);
    match model::validate(candidate) {
        Ok(()) => json!({ "valid": true, "error": null, "alignment": alignment }),
        Err(e) => json!({ "valid": false, "error": e.to_string(), "alignment": alignment }),
    }
}

/// Checks `params.record` when given, otherwise the stored record.
fn handle_record_validate(state: &mut AppState, req: &Request) -> Value {
    if let Some(raw) = req.params.get("record") {
        return match serde_json::from_value::<StudentRecord>(raw.clone()) {
            Ok(candidate) => ok(&req.id, validation_report(&candidate)),
            Err(e) => ok(
                &req.id,
                json!({ "valid": false, "error": e.to_string(), "alignment": [] }),
            ),
        };
    }
    match record(state, req) {
        Ok(r) => ok(&req.id, validation_report(r)),
        Err(e) => e,
    }
}

fn handle_profile_options(state: &mut AppState, req: &Request) -> Value {
    let r = match record(state, req) {
        Ok(r) => r,
        Err(e) => return e,
    };
    let unlocked: Vec<_> = BADGE_CATALOG
        .iter()
        .filter(|b| r.badges_unlocked.iter().any(|u| u == b.emoji))
        .collect();
    ok(
        &req.id,
        json!({
            "avatars": AVATARS,
            "profileColors": PROFILE_COLORS,
            "maxVisibleBadges": MAX_VISIBLE_BADGES,
            "unlockedBadges": unlocked,
            "current": {
                "avatar": r.avatar,
                "profileColor": r.profile_color,
                "visibleBadges": r.visible_badges,
            }
        }),
    )
}

fn optional_string(req: &Request, key: &str) -> Result<Option<String>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("params.{} must be a string", key),
            None,
        )),
    }
}

fn parse_customization(req: &Request) -> Result<Customization, Value> {
    Ok(Customization {
        avatar: optional_string(req, "avatar")?,
        visible_badges: optional_str_list(req, "visibleBadges")?,
        profile_color: optional_string(req, "profileColor")?,
    })
}

fn handle_profile_customize(state: &mut AppState, req: &Request) -> Value {
    let changes = match parse_customization(req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let (conn, stores) = match workspace_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match stores.record.customize(conn, changes) {
        Ok(r) => ok(&req.id, json!({ "record": r })),
        Err(e) => store_err(req, e),
    }
}

/// The full catalog, flagged against the current record when a workspace is open.
fn handle_badges_list(state: &mut AppState, req: &Request) -> Value {
    let current = state.stores.as_ref().map(|s| s.record.record());
    let badges: Vec<Value> = BADGE_CATALOG
        .iter()
        .map(|b| {
            let unlocked = current.map(|r| r.badges_unlocked.iter().any(|u| u == b.emoji));
            let visible = current.map(|r| {
                r.visible_badges
                    .as_ref()
                    .is_some_and(|v| v.iter().any(|u| u == b.emoji))
            });
            json!({
                "emoji": b.emoji,
                "name": b.name,
                "description": b.description,
                "unlocked": unlocked,
                "visible": visible,
            })
        })
        .collect();
    ok(&req.id, json!({ "badges": badges }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "record.get" => Some(handle_record_get(state, req)),
        "record.update" => Some(handle_record_update(state, req)),
        "record.reset" => Some(handle_record_reset(state, req)),
        "record.validate" => Some(handle_record_validate(state, req)),
        "profile.options" => Some(handle_profile_options(state, req)),
        "profile.customize" => Some(handle_profile_customize(state, req)),
        "badges.list" => Some(handle_badges_list(state, req)),
        _ => None,
    }
}
