use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::status;
use crate::workspace::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|w| w.root().to_string_lossy().to_string())
        }),
    )
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

    match Workspace::open(&path, &state.config.class.default_name) {
        Ok(ws) => {
            let result = json!({
                "workspacePath": path.to_string_lossy(),
                "className": ws.class_name(),
                "students": ws.roster().len(),
                "entries": ws.store.entries().len(),
                "droppedRows": ws.store.dropped_rows(),
                "degraded": ws.store.is_degraded(),
            });
            state.workspace = Some(ws);
            ok(&req.id, result)
        }
        Err(e) => err(&req.id, "workspace_open_failed", format!("{e:#}"), None),
    }
}

fn handle_statuses_list(req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "statuses": status::status_labels(),
            "defaultStatus": status::DEFAULT_STATUS,
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        "statuses.list" => Some(handle_statuses_list(req)),
        _ => None,
    }
}
