use crate::ipc::error::ok;
use crate::ipc::helpers::{
    get_optional_date, get_optional_path, get_optional_str, get_required_date, get_required_i64,
    no_workspace, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::records::{format_date, AttendanceEntry};
use crate::report::{ExportTable, Reports, TieBreak};
use chrono::NaiveDate;
use serde_json::json;

fn entry_json(e: &AttendanceEntry) -> serde_json::Value {
    json!({
        "date": format_date(e.date),
        "studentName": e.student_name,
        "status": e.status,
        "note": e.note,
    })
}

/// File name for the download, plus the written path when `outPath` is set.
fn export_json(table: &dyn ExportTable, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let file_name = table.export_file_name();
    let Some(out_path) = get_optional_path(params, "outPath") else {
        return Ok(json!({ "fileName": file_name }));
    };
    let bytes = table.to_export_bytes();
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                HandlerErr::new("export_write_failed", e.to_string())
                    .with_details(json!({ "outPath": out_path.to_string_lossy() }))
            })?;
        }
    }
    std::fs::write(&out_path, &bytes).map_err(|e| {
        HandlerErr::new("export_write_failed", e.to_string())
            .with_details(json!({ "outPath": out_path.to_string_lossy() }))
    })?;
    tracing::info!(out = %out_path.display(), bytes = bytes.len(), "wrote report export");
    Ok(json!({
        "fileName": file_name,
        "outPath": out_path.to_string_lossy(),
        "bytesWritten": bytes.len(),
    }))
}

fn reports_monthly(reports: &Reports, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let year = get_required_i64(params, "year")?;
    let month = get_required_i64(params, "month")?;
    if !(1..=12).contains(&month) {
        return Err(HandlerErr::bad_params("month must be between 1 and 12"));
    }
    let year = i32::try_from(year).map_err(|_| HandlerErr::bad_params("year out of range"))?;
    let grid = reports.monthly_grid(year, month as u32);

    let rows_json: Vec<serde_json::Value> = grid
        .rows
        .iter()
        .map(|r| {
            let tally: serde_json::Map<String, serde_json::Value> = r
                .tally()
                .into_iter()
                .map(|(label, n)| (label, json!(n)))
                .collect();
            json!({
                "studentName": r.student_name,
                "cells": r.cells,
                "tally": tally,
            })
        })
        .collect();
    Ok(json!({
        "year": grid.year,
        "month": grid.month,
        "days": grid.days,
        "rows": rows_json,
        "empty": grid.is_empty(),
        "export": export_json(&grid, params)?,
    }))
}

fn reports_daily(reports: &Reports, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let date = get_required_date(params, "date")?;
    let view = reports.single_day(date);
    let rows: Vec<serde_json::Value> = view.rows.iter().map(entry_json).collect();
    Ok(json!({
        "date": format_date(view.date),
        "rows": rows,
        "export": export_json(&view, params)?,
    }))
}

fn reports_student_range(
    reports: &Reports,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let student = get_optional_str(params, "studentName");
    let start = range_endpoint(params, "startDate");
    let end = range_endpoint(params, "endDate");
    match reports.student_range(student.as_deref(), start, end) {
        Ok(view) => {
            let rows: Vec<serde_json::Value> = view.rows.iter().map(entry_json).collect();
            Ok(json!({
                "ran": true,
                "studentName": view.student_name,
                "startDate": format_date(view.start),
                "endDate": format_date(view.end),
                "rows": rows,
                "export": export_json(&view, params)?,
            }))
        }
        Err(skipped) => Ok(json!({
            "ran": false,
            "reason": skipped.code(),
            "message": skipped.to_string(),
            "rows": [],
        })),
    }
}

/// An endpoint that does not parse is an incomplete range, same as a blank one.
fn range_endpoint(params: &serde_json::Value, key: &str) -> Option<NaiveDate> {
    get_optional_date(params, key).unwrap_or_else(|e| {
        tracing::debug!(key, error = %e.message, "ignoring unparseable range endpoint");
        None
    })
}

fn with_reports(
    state: &AppState,
    req: &Request,
    f: fn(&Reports, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(ws) = state.workspace.as_ref() else {
        return no_workspace(&req.id);
    };
    let tie_break: TieBreak = state.config.reports.monthly_tie_break;
    let reports = Reports::new(ws.store.entries(), tie_break);
    match f(&reports, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "reports.monthly" => Some(with_reports(state, req, reports_monthly)),
        "reports.daily" => Some(with_reports(state, req, reports_daily)),
        "reports.studentRange" => Some(with_reports(state, req, reports_student_range)),
        _ => None,
    }
}
