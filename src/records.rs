//! Append-only attendance record store backed by `attendance_records.csv`.
//!
//! Loading never fails: a missing file is an empty store, a file that cannot
//! be parsed as a whole degrades to an empty store, and rows whose date does
//! not parse are dropped and counted. Writing rewrites the whole file and
//! propagates I/O errors to the caller.

use crate::csv;
use crate::status;
use anyhow::{anyhow, Context};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const RECORDS_FILE: &str = "attendance_records.csv";
pub const RECORD_HEADER: [&str; 4] = ["date", "student_name", "status", "note"];

// English headers first; the Chinese ones are what the original tool wrote.
const DATE_COLUMN: &[&str] = &["date", "日期"];
const STUDENT_COLUMN: &[&str] = &["student_name", "學生姓名"];
const STATUS_COLUMN: &[&str] = &["status", "狀態"];
const NOTE_COLUMN: &[&str] = &["note", "備註"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceEntry {
    pub date: NaiveDate,
    pub student_name: String,
    pub status: String,
    pub note: String,
}

impl AttendanceEntry {
    pub fn new(
        date: NaiveDate,
        student_name: impl Into<String>,
        status: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        Self {
            date,
            student_name: student_name.into(),
            status: status.into(),
            note: note.into(),
        }
    }

    pub fn to_fields(&self) -> Vec<String> {
        vec![
            format_date(self.date),
            self.student_name.clone(),
            self.status.clone(),
            self.note.clone(),
        ]
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub entries: Vec<AttendanceEntry>,
    /// Rows skipped because the date did not parse or the row was malformed.
    pub dropped_rows: usize,
    /// True when the file existed but could not be read as a table at all.
    pub degraded: bool,
}

pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a stored date. Accepts plain dates, date-times (time discarded) and
/// slash-separated dates.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let t = raw.trim();
    if t.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(t, fmt) {
            return Some(d);
        }
    }
    for fmt in [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(t, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse the full content of a record file.
///
/// Errors only when the content is not a table at all (bad encoding,
/// unbalanced quotes, no header, or no date/student column).
pub fn parse_records(bytes: &[u8]) -> anyhow::Result<(Vec<AttendanceEntry>, usize)> {
    let text = csv::decode_text(bytes)?;
    let mut records = csv::parse_csv_text(&text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| anyhow!("record file has no header row"))?;
    let date_idx = csv::column_index(&header, DATE_COLUMN)
        .ok_or_else(|| anyhow!("record file has no date column"))?;
    let student_idx = csv::column_index(&header, STUDENT_COLUMN)
        .ok_or_else(|| anyhow!("record file has no student column"))?;
    let status_idx = csv::column_index(&header, STATUS_COLUMN);
    let note_idx = csv::column_index(&header, NOTE_COLUMN);

    let field = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    let mut entries = Vec::new();
    let mut dropped = 0usize;
    for row in records {
        if row.len() > header.len() {
            dropped += 1;
            continue;
        }
        let Some(date) = row.get(date_idx).and_then(|d| parse_record_date(d)) else {
            dropped += 1;
            continue;
        };
        entries.push(AttendanceEntry {
            date,
            student_name: field(&row, Some(student_idx)),
            status: field(&row, status_idx),
            note: field(&row, note_idx),
        });
    }
    Ok((entries, dropped))
}

pub fn load_records(path: &Path) -> LoadOutcome {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no record file yet; starting empty");
        return LoadOutcome::default();
    }
    let parsed = std::fs::read(path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))
        .and_then(|bytes| parse_records(&bytes));
    match parsed {
        Ok((entries, dropped_rows)) => {
            if dropped_rows > 0 {
                tracing::warn!(
                    path = %path.display(),
                    dropped_rows,
                    "dropped unreadable attendance rows"
                );
            }
            tracing::info!(path = %path.display(), rows = entries.len(), "loaded attendance records");
            LoadOutcome {
                entries,
                dropped_rows,
                degraded: false,
            }
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %format!("{e:#}"),
                "record file unreadable; continuing with an empty store"
            );
            LoadOutcome {
                entries: Vec::new(),
                dropped_rows: 0,
                degraded: true,
            }
        }
    }
}

pub fn encode_records(entries: &[AttendanceEntry]) -> Vec<u8> {
    let rows: Vec<Vec<String>> = entries.iter().map(|e| e.to_fields()).collect();
    csv::write_csv_bytes(&RECORD_HEADER, &rows)
}

pub fn persist_records(path: &Path, entries: &[AttendanceEntry]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.to_string_lossy()))?;
    }
    std::fs::write(path, encode_records(entries))
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))
}

/// Write `existing` followed by `new_rows` over the record file.
pub fn append_and_persist(
    path: &Path,
    existing: &[AttendanceEntry],
    new_rows: &[AttendanceEntry],
) -> anyhow::Result<()> {
    let mut all = Vec::with_capacity(existing.len() + new_rows.len());
    all.extend_from_slice(existing);
    all.extend_from_slice(new_rows);
    persist_records(path, &all)
}

/// One form row of a batch save.
#[derive(Debug, Clone)]
pub struct BatchSubmission {
    pub student_name: String,
    pub status: String,
    pub note: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchError {
    #[error("roster is empty; add students before taking attendance")]
    EmptyRoster,
    #[error("student not on roster: {0}")]
    UnknownStudent(String),
    #[error("unknown status {status:?} for {student}")]
    UnknownStatus { student: String, status: String },
}

/// Expand form submissions into one entry per roster student, in roster
/// order. Roster students without a submission get the default status.
pub fn build_batch(
    date: NaiveDate,
    roster: &[String],
    submissions: &[BatchSubmission],
) -> Result<Vec<AttendanceEntry>, BatchError> {
    if roster.is_empty() {
        return Err(BatchError::EmptyRoster);
    }
    let mut by_student: HashMap<&str, &BatchSubmission> = HashMap::new();
    for s in submissions {
        if !roster.iter().any(|r| r == &s.student_name) {
            return Err(BatchError::UnknownStudent(s.student_name.clone()));
        }
        if !status::is_status_label(&s.status) {
            return Err(BatchError::UnknownStatus {
                student: s.student_name.clone(),
                status: s.status.clone(),
            });
        }
        by_student.insert(s.student_name.as_str(), s);
    }
    Ok(roster
        .iter()
        .map(|name| match by_student.get(name.as_str()) {
            Some(s) => AttendanceEntry::new(date, name.as_str(), s.status.as_str(), s.note.as_str()),
            None => AttendanceEntry::new(date, name.as_str(), status::DEFAULT_STATUS, ""),
        })
        .collect())
}

/// In-memory snapshot of the record file with an explicit reload/save pair.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    entries: Vec<AttendanceEntry>,
    dropped_rows: usize,
    degraded: bool,
}

impl RecordStore {
    pub fn open(workspace: &Path) -> Self {
        let mut store = Self {
            path: workspace.join(RECORDS_FILE),
            entries: Vec::new(),
            dropped_rows: 0,
            degraded: false,
        };
        store.reload();
        store
    }

    pub fn reload(&mut self) {
        let outcome = load_records(&self.path);
        self.entries = outcome.entries;
        self.dropped_rows = outcome.dropped_rows;
        self.degraded = outcome.degraded;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[AttendanceEntry] {
        &self.entries
    }

    pub fn dropped_rows(&self) -> usize {
        self.dropped_rows
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    /// Append a batch, persist the whole table, then re-read it from disk.
    pub fn save_batch(&mut self, new_rows: &[AttendanceEntry]) -> anyhow::Result<usize> {
        append_and_persist(&self.path, &self.entries, new_rows)?;
        tracing::info!(
            path = %self.path.display(),
            appended = new_rows.len(),
            total = self.entries.len() + new_rows.len(),
            "persisted attendance batch"
        );
        self.reload();
        Ok(new_rows.len())
    }
}
