use rusqlite::Connection;
use serde_json::Value;

use crate::ipc::error::err;
use crate::ipc::types::{AppState, Request};
use crate::model::StudentRecord;
use crate::store::{StoreError, Stores};

pub fn required_str(req: &Request, key: &str) -> Result<String, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing params.{}", key), None))
}

/// Optional array of strings; anything other than absent, null or a string array is rejected.
pub fn optional_str_list(req: &Request, key: &str) -> Result<Option<Vec<String>>, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| v.as_str().map(|s| s.to_string()))
            .collect::<Option<Vec<_>>>()
            .map(Some)
            .ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("params.{} must contain only strings", key),
                    None,
                )
            }),
        Some(_) => Err(err(
            &req.id,
            "bad_params",
            format!("params.{} must be an array", key),
            None,
        )),
    }
}

pub fn optional_usize(req: &Request, key: &str, default: usize) -> Result<usize, Value> {
    match req.params.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v.as_u64().map(|n| n as usize).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("params.{} must be a non-negative integer", key),
                None,
            )
        }),
    }
}

fn no_workspace(req: &Request) -> Value {
    err(&req.id, "no_workspace", "select a workspace first", None)
}

pub fn record<'a>(state: &'a AppState, req: &Request) -> Result<&'a StudentRecord, Value> {
    state
        .stores
        .as_ref()
        .map(|s| s.record.record())
        .ok_or_else(|| no_workspace(req))
}

pub fn workspace_mut<'a>(
    state: &'a mut AppState,
    req: &Request,
) -> Result<(&'a Connection, &'a mut Stores), Value> {
    match (state.db.as_ref(), state.stores.as_mut()) {
        (Some(conn), Some(stores)) => Ok((conn, stores)),
        _ => Err(no_workspace(req)),
    }
}

pub fn store_err(req: &Request, e: StoreError) -> Value {
    err(&req.id, e.code(), e.to_string(), None)
}
