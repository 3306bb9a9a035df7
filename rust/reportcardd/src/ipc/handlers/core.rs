use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::metrics;
use crate::narrative::NarrativeSession;
use crate::store::Stores;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

/// Opens `path` as the active workspace and loads its stores.
pub fn select_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<serde_json::Value> {
    let conn = db::open_db(path)?;
    let (stores, source) = Stores::init(&conn)?;

    let record = stores.record.record();
    let alignment = metrics::history_alignment(&record.subjects, &record.exams);
    for issue in &alignment {
        warn!(
            subject = %issue.subject,
            history = issue.history_len,
            completed = issue.completed_exams,
            "subject history does not line up with completed exams"
        );
    }
    let result = json!({
        "workspacePath": path.to_string_lossy(),
        "recordSource": source,
        "theme": stores.theme.theme(),
        "alignment": alignment,
    });

    info!(workspace = %path.display(), source = ?source, "workspace selected");
    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.stores = Some(stores);
    state.narrative = NarrativeSession::default();
    Ok(result)
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match select_workspace(state, &path) {
        Ok(result) => ok(&req.id, result),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
