use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{required_str, store_err, workspace_mut};
use crate::ipc::types::{AppState, Request};
use crate::store::Theme;
use serde_json::{json, Value};

fn theme_json(theme: Theme) -> Value {
    json!({
        "id": theme.as_str(),
        "displayName": theme.display_name(),
        "isDark": theme.is_dark(),
    })
}

fn handle_theme_get(state: &mut AppState, req: &Request) -> Value {
    match state.stores.as_ref() {
        Some(stores) => ok(&req.id, json!({ "theme": theme_json(stores.theme.theme()) })),
        None => err(&req.id, "no_workspace", "select a workspace first", None),
    }
}

fn handle_theme_set(state: &mut AppState, req: &Request) -> Value {
    let id = match required_str(req, "theme") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(theme) = Theme::parse(&id) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown theme: {}", id),
            Some(json!({ "allowed": Theme::ALL.map(Theme::as_str) })),
        );
    };
    let (conn, stores) = match workspace_mut(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match stores.theme.set(conn, theme) {
        Ok(t) => ok(&req.id, json!({ "theme": theme_json(t) })),
        Err(e) => store_err(req, e),
    }
}

fn handle_theme_list(_state: &mut AppState, req: &Request) -> Value {
    let themes: Vec<Value> = Theme::ALL.iter().map(|t| theme_json(*t)).collect();
    ok(&req.id, json!({ "themes": themes }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "theme.get" => Some(handle_theme_get(state, req)),
        "theme.set" => Some(handle_theme_set(state, req)),
        "theme.list" => Some(handle_theme_list(state, req)),
        _ => None,
    }
}
