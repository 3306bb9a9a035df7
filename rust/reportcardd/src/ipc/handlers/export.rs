use crate::export::{self, ChartCapture, EXPORT_SECTIONS};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::optional_str_list;
use crate::ipc::types::{AppState, Request};
use serde_json::{json, Value};
use std::path::PathBuf;

fn handle_sections_list(_state: &mut AppState, req: &Request) -> Value {
    ok(&req.id, json!({ "sections": EXPORT_SECTIONS }))
}

fn handle_sections_run(state: &mut AppState, req: &Request) -> Value {
    let selected = match optional_str_list(req, "sections") {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "bad_params", "missing params.sections", None),
        Err(e) => return e,
    };
    let (Some(workspace), Some(stores)) = (state.workspace.as_ref(), state.stores.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let out_dir = req
        .params
        .get("outDir")
        .and_then(|v| v.as_str())
        .map(PathBuf::from)
        .unwrap_or_else(|| workspace.join("exports"));

    let capture = ChartCapture::new(
        stores.record.record(),
        stores.theme.theme(),
        state.export.pixel_ratio,
    );
    match export::export_sections(&capture, &selected, &out_dir, state.export.settle) {
        Ok(report) => ok(
            &req.id,
            json!({
                "outDir": out_dir.to_string_lossy(),
                "files": report.files,
                "skipped": report.skipped,
            }),
        ),
        Err(e) => err(&req.id, "export_failed", e.to_string(), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "export.sections.list" => Some(handle_sections_list(state, req)),
        "export.sections.run" => Some(handle_sections_run(state, req)),
        _ => None,
    }
}
