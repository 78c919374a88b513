use crate::ipc::error::ok;
use crate::ipc::helpers::{get_required_date, no_workspace, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::records::{self, BatchError, BatchSubmission};
use crate::status;
use crate::workspace::Workspace;
use serde_json::json;

fn store_summary(ws: &Workspace) -> serde_json::Value {
    json!({
        "entries": ws.store.entries().len(),
        "droppedRows": ws.store.dropped_rows(),
        "degraded": ws.store.is_degraded(),
        "path": ws.store.path().to_string_lossy(),
    })
}

fn parse_submissions(params: &serde_json::Value) -> Result<Vec<BatchSubmission>, HandlerErr> {
    let Some(raw) = params.get("entries") else {
        return Ok(Vec::new());
    };
    let Some(arr) = raw.as_array() else {
        return Err(HandlerErr::bad_params("entries must be an array"));
    };
    let mut out = Vec::with_capacity(arr.len());
    for (i, v) in arr.iter().enumerate() {
        let Some(student_name) = v.get("studentName").and_then(|s| s.as_str()) else {
            return Err(HandlerErr::bad_params(format!("entries[{}] missing studentName", i)));
        };
        let status = v
            .get("status")
            .and_then(|s| s.as_str())
            .unwrap_or(status::DEFAULT_STATUS);
        let note = v.get("note").and_then(|s| s.as_str()).unwrap_or("");
        out.push(BatchSubmission {
            student_name: student_name.to_string(),
            status: status.to_string(),
            note: note.to_string(),
        });
    }
    Ok(out)
}

fn attendance_batch_save(
    ws: &mut Workspace,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_date(params, "date")?;
    let submissions = parse_submissions(params)?;
    let batch = records::build_batch(date, ws.roster(), &submissions).map_err(|e| {
        let code = match &e {
            BatchError::EmptyRoster => "empty_roster",
            BatchError::UnknownStudent(_) => "unknown_student",
            BatchError::UnknownStatus { .. } => "unknown_status",
        };
        HandlerErr::new(code, e.to_string())
    })?;

    let saved = ws.store.save_batch(&batch).map_err(|e| {
        tracing::error!(error = %format!("{e:#}"), date = %date, "batch save failed");
        HandlerErr::new("store_write_failed", format!("{e:#}"))
            .with_details(json!({ "path": ws.store.path().to_string_lossy() }))
    })?;

    Ok(json!({
        "date": records::format_date(date),
        "saved": saved,
        "store": store_summary(ws),
    }))
}

fn handle_attendance_status(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    ok(&req.id, store_summary(ws))
}

fn handle_attendance_reload(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    ws.store.reload();
    ok(&req.id, store_summary(ws))
}

fn handle_attendance_batch_save(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(ws) = state.workspace.as_mut() else {
        return no_workspace(&req.id);
    };
    match attendance_batch_save(ws, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "attendance.status" => Some(handle_attendance_status(state, req)),
        "attendance.reload" => Some(handle_attendance_reload(state, req)),
        "attendance.batchSave" => Some(handle_attendance_batch_save(state, req)),
        _ => None,
    }
}
