use crate::ipc::error::ok;
use crate::ipc::helpers::{no_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::roster;
use crate::workspace::Workspace;
use serde_json::json;

fn roster_set(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let names: Vec<String> = if let Some(arr) = params.get("names").and_then(|v| v.as_array()) {
        let mut out = Vec::with_capacity(arr.len());
        for v in arr {
            let Some(s) = v.as_str() else {
                return Err(HandlerErr::bad_params("names must be strings"));
            };
            out.push(s.to_string());
        }
        roster::normalize_names(out)
    } else if let Some(text) = params.get("text").and_then(|v| v.as_str()) {
        roster::parse_roster_text(text)
    } else {
        return Err(HandlerErr::bad_params("missing names or text"));
    };

    let saved = ws.set_roster(&names).map_err(|e| {
        HandlerErr::new("roster_write_failed", format!("{e:#}"))
    })?;
    Ok(json!({ "names": saved }))
}

fn handle_roster_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, json!({ "names": ws.roster() }))
}

fn handle_roster_set(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    match roster_set(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "roster.get" => Some(handle_roster_get(state, req)),
        "roster.set" => Some(handle_roster_set(state, req)),
        _ => None,
    }
}
