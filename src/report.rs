//! Read-only views over a record snapshot. Each view can render itself as a
//! downloadable CSV with the same encoding as the record file.

use crate::csv;
use crate::records::{format_date, AttendanceEntry, RECORD_HEADER};
use crate::status;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use thiserror::Error;

/// Placeholder for a (student, day) cell with no entry.
pub const MISSING_CELL: &str = "-";

/// Which entry fills a monthly cell when a student has several for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TieBreak {
    /// Earliest row in file order.
    #[default]
    First,
    /// Latest row in file order.
    Last,
}

pub trait ExportTable {
    fn export_file_name(&self) -> String;
    fn export_header(&self) -> Vec<String>;
    fn export_rows(&self) -> Vec<Vec<String>>;

    fn to_export_bytes(&self) -> Vec<u8> {
        let header = self.export_header();
        let header_refs: Vec<&str> = header.iter().map(|h| h.as_str()).collect();
        csv::write_csv_bytes(&header_refs, &self.export_rows())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridRow {
    pub student_name: String,
    /// One cell per entry of `MonthlyGrid::days`.
    pub cells: Vec<String>,
}

impl GridRow {
    /// Status counts over this row's filled cells, in vocabulary order with
    /// unrecognized labels after.
    pub fn tally(&self) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for cell in &self.cells {
            if cell != MISSING_CELL {
                *counts.entry(cell.as_str()).or_insert(0) += 1;
            }
        }
        let mut out: Vec<(String, usize)> = Vec::new();
        for label in status::status_labels() {
            if let Some(n) = counts.remove(label) {
                out.push((label.to_string(), n));
            }
        }
        let mut rest: Vec<(String, usize)> = counts
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        rest.sort();
        out.extend(rest);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyGrid {
    pub year: i32,
    pub month: u32,
    pub days: Vec<u32>,
    pub rows: Vec<GridRow>,
}

impl MonthlyGrid {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl ExportTable for MonthlyGrid {
    fn export_file_name(&self) -> String {
        format!("Monthly_{}_{}.csv", self.year, self.month)
    }

    fn export_header(&self) -> Vec<String> {
        let mut header = vec![RECORD_HEADER[1].to_string()];
        header.extend(self.days.iter().map(|d| d.to_string()));
        header
    }

    fn export_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|r| {
                let mut row = vec![r.student_name.clone()];
                row.extend(r.cells.iter().cloned());
                row
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyView {
    pub date: NaiveDate,
    pub rows: Vec<AttendanceEntry>,
}

impl ExportTable for DailyView {
    fn export_file_name(&self) -> String {
        format!("Daily_{}.csv", format_date(self.date))
    }

    fn export_header(&self) -> Vec<String> {
        RECORD_HEADER.iter().map(|h| h.to_string()).collect()
    }

    fn export_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|e| e.to_fields()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentRange {
    pub student_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Most recent first.
    pub rows: Vec<AttendanceEntry>,
}

impl ExportTable for StudentRange {
    fn export_file_name(&self) -> String {
        format!("{}_report.csv", self.student_name)
    }

    fn export_header(&self) -> Vec<String> {
        RECORD_HEADER.iter().map(|h| h.to_string()).collect()
    }

    fn export_rows(&self) -> Vec<Vec<String>> {
        self.rows.iter().map(|e| e.to_fields()).collect()
    }
}

/// Why a per-student range query was not run. Not an error: the caller shows
/// an empty "nothing selected" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuerySkipped {
    #[error("no student selected")]
    NoStudent,
    #[error("date range needs both a start and an end")]
    IncompleteRange,
    #[error("range start is after range end")]
    ReversedRange,
}

impl QuerySkipped {
    pub fn code(self) -> &'static str {
        match self {
            Self::NoStudent => "no_student",
            Self::IncompleteRange => "incomplete_range",
            Self::ReversedRange => "reversed_range",
        }
    }
}

pub fn monthly_grid(
    entries: &[AttendanceEntry],
    year: i32,
    month: u32,
    tie_break: TieBreak,
) -> MonthlyGrid {
    let mut days: BTreeSet<u32> = BTreeSet::new();
    let mut by_student: BTreeMap<&str, HashMap<u32, &str>> = BTreeMap::new();
    for e in entries
        .iter()
        .filter(|e| e.date.year() == year && e.date.month() == month)
    {
        let day = e.date.day();
        days.insert(day);
        let cells = by_student.entry(e.student_name.as_str()).or_default();
        match tie_break {
            TieBreak::First => {
                cells.entry(day).or_insert(e.status.as_str());
            }
            TieBreak::Last => {
                cells.insert(day, e.status.as_str());
            }
        }
    }
    let days: Vec<u32> = days.into_iter().collect();
    let rows = by_student
        .into_iter()
        .map(|(student, cells)| GridRow {
            student_name: student.to_string(),
            cells: days
                .iter()
                .map(|d| cells.get(d).copied().unwrap_or(MISSING_CELL).to_string())
                .collect(),
        })
        .collect();
    MonthlyGrid {
        year,
        month,
        days,
        rows,
    }
}

pub fn single_day(entries: &[AttendanceEntry], date: NaiveDate) -> DailyView {
    DailyView {
        date,
        rows: entries.iter().filter(|e| e.date == date).cloned().collect(),
    }
}

/// `student_name` equal to the `-` placeholder or blank counts as no
/// selection. Names match after trimming.
pub fn student_range(
    entries: &[AttendanceEntry],
    student_name: Option<&str>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<StudentRange, QuerySkipped> {
    let student = student_name
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != MISSING_CELL)
        .ok_or(QuerySkipped::NoStudent)?;
    let (Some(start), Some(end)) = (start, end) else {
        return Err(QuerySkipped::IncompleteRange);
    };
    if start > end {
        return Err(QuerySkipped::ReversedRange);
    }
    let mut rows: Vec<AttendanceEntry> = entries
        .iter()
        .filter(|e| e.student_name.trim() == student && e.date >= start && e.date <= end)
        .cloned()
        .collect();
    rows.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(StudentRange {
        student_name: student.to_string(),
        start,
        end,
        rows,
    })
}

/// Report views bound to one snapshot.
pub struct Reports<'a> {
    entries: &'a [AttendanceEntry],
    tie_break: TieBreak,
}

impl<'a> Reports<'a> {
    pub fn new(entries: &'a [AttendanceEntry], tie_break: TieBreak) -> Self {
        Self { entries, tie_break }
    }

    pub fn monthly_grid(&self, year: i32, month: u32) -> MonthlyGrid {
        monthly_grid(self.entries, year, month, self.tie_break)
    }

    pub fn single_day(&self, date: NaiveDate) -> DailyView {
        single_day(self.entries, date)
    }

    pub fn student_range(
        &self,
        student_name: Option<&str>,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<StudentRange, QuerySkipped> {
        student_range(self.entries, student_name, start, end)
    }
}
