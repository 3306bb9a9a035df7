use crate::ipc::error::{err, ok};
use crate::ipc::helpers::record;
use crate::ipc::types::{AppState, Request};
use crate::narrative::{self, FAILURE_MESSAGE};
use serde_json::{json, Value};

fn handle_prompt(state: &mut AppState, req: &Request) -> Value {
    match record(state, req) {
        Ok(r) => ok(&req.id, json!({ "prompt": narrative::build_prompt(r) })),
        Err(e) => e,
    }
}

fn handle_generate(state: &mut AppState, req: &Request) -> Value {
    let Some(stores) = state.stores.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    let outcome = narrative::generate(
        &mut state.narrative,
        state.generator.as_ref(),
        stores.record.record(),
    );
    let snapshot = state.narrative.snapshot();
    match outcome {
        Ok(_) => ok(&req.id, json!({ "narrative": snapshot })),
        Err(e) => err(
            &req.id,
            "ai_failed",
            FAILURE_MESSAGE,
            Some(json!({
                "retryable": true,
                "cause": e.to_string(),
                "narrative": snapshot,
            })),
        ),
    }
}

fn handle_get(state: &mut AppState, req: &Request) -> Value {
    ok(&req.id, json!({ "narrative": state.narrative.snapshot() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    match req.method.as_str() {
        "ai.narrative.prompt" => Some(handle_prompt(state, req)),
        "ai.narrative.generate" => Some(handle_generate(state, req)),
        "ai.narrative.get" => Some(handle_get(state, req)),
        _ => None,
    }
}
