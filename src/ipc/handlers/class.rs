use crate::classinfo;
use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_str, no_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::workspace::Workspace;
use serde_json::json;
use std::path::PathBuf;

fn class_get(ws: &Workspace) -> serde_json::Value {
    let has_logo = classinfo::has_logo(ws.root());
    let logo_path: Option<String> = has_logo
        .then(|| classinfo::logo_path(ws.root()).to_string_lossy().to_string());
    json!({
        "name": ws.class_name(),
        "hasLogo": has_logo,
        "logoPath": logo_path,
    })
}

fn class_set_name(ws: &mut Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let name = get_required_str(params, "name")?;
    if name.trim().is_empty() {
        return Err(HandlerErr::bad_params("name must not be empty"));
    }
    let saved = ws
        .set_class_name(&name)
        .map_err(|e| HandlerErr::new("class_write_failed", format!("{e:#}")))?;
    Ok(json!({ "name": saved }))
}

fn class_set_logo(ws: &Workspace, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let source = PathBuf::from(get_required_str(params, "sourcePath")?);
    if !source.is_file() {
        return Err(HandlerErr::bad_params("sourcePath is not a file")
            .with_details(json!({ "sourcePath": source.to_string_lossy() })));
    }
    let format = classinfo::install_logo(ws.root(), &source)
        .map_err(|e| HandlerErr::new("logo_rejected", format!("{e:#}")))?;
    Ok(json!({
        "logoPath": classinfo::logo_path(ws.root()).to_string_lossy(),
        "format": format.as_str(),
    }))
}

fn class_clear_logo(ws: &Workspace) -> Result<serde_json::Value, HandlerErr> {
    let removed = classinfo::clear_logo(ws.root())
        .map_err(|e| HandlerErr::new("class_write_failed", format!("{e:#}")))?;
    Ok(json!({ "removed": removed }))
}

fn handle_class_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, class_get(ws))
}

fn handle_class_set_name(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    match class_set_name(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_class_set_logo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    match class_set_logo(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

fn handle_class_clear_logo(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    match class_clear_logo(ws) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "class.get" => Some(handle_class_get(state, req)),
        "class.setName" => Some(handle_class_set_name(state, req)),
        "class.setLogo" => Some(handle_class_set_logo(state, req)),
        "class.clearLogo" => Some(handle_class_clear_logo(state, req)),
        _ => None,
    }
}
