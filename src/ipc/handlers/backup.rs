use crate::backup;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, no_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn backup_export(ws: &Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let out_path = PathBuf::from(get_required_str(params, "outPath")?);
    let summary = backup::export_workspace_bundle(ws.root(), &out_path).map_err(|e| {
        HandlerErr::new("backup_failed", format!("{e:#}"))
            .with_details(json!({ "outPath": out_path.to_string_lossy() }))
    })?;
    Ok(json!({
        "bundleFormat": summary.bundle_format,
        "bundleId": summary.bundle_id,
        "entryCount": summary.files.len(),
        "files": summary.files,
        "outPath": out_path.to_string_lossy(),
    }))
}

fn backup_import(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let in_path = PathBuf::from(get_required_str(params, "inPath")?);
    let summary = backup::import_workspace_bundle(&in_path, ws.root()).map_err(|e| {
        HandlerErr::new("backup_failed", format!("{e:#}"))
            .with_details(json!({ "inPath": in_path.to_string_lossy() }))
    })?;
    ws.reload();
    Ok(json!({
        "bundleFormatDetected": summary.bundle_format_detected,
        "bundleId": summary.bundle_id,
        "restored": summary.restored,
        "removed": summary.removed,
        "entries": ws.store.entries().len(),
        "students": ws.roster().len(),
        "className": ws.class_name(),
    }))
}

fn handle_backup_export(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    match backup_export(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_backup_import(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    match backup_import(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "backup.exportWorkspaceBundle" => Some(handle_backup_export(state, req)),
        "backup.importWorkspaceBundle" => Some(handle_backup_import(state, req)),
        _ => None,
    }
}
