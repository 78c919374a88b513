use crate::csv;
use anyhow::{anyhow, Context};
use std::path::Path;

pub const ROSTER_FILE: &str = "master_list.csv";
const NAME_COLUMN: &[&str] = &["name", "姓名"];

/// Read roster names, sorted ascending. A missing or unreadable file is an
/// empty roster.
pub fn load_roster(workspace: &Path) -> Vec<String> {
    let path = workspace.join(ROSTER_FILE);
    if !path.exists() {
        return Vec::new();
    }
    let parsed = std::fs::read(&path)
        .with_context(|| format!("failed to read {}", path.to_string_lossy()))
        .and_then(|bytes| parse_roster(&bytes));
    match parsed {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "roster unreadable; using an empty roster");
            Vec::new()
        }
    }
}

pub fn parse_roster(bytes: &[u8]) -> anyhow::Result<Vec<String>> {
    let text = csv::decode_text(bytes)?;
    let mut records = csv::parse_csv_text(&text)?.into_iter();
    let header = records
        .next()
        .ok_or_else(|| anyhow!("roster file has no header row"))?;
    let idx = csv::column_index(&header, NAME_COLUMN)
        .ok_or_else(|| anyhow!("roster file has no name column"))?;
    let names: Vec<String> = records
        .filter_map(|row| row.get(idx).cloned())
        .collect();
    Ok(normalize_names(names))
}

/// Trim, drop blanks and duplicates, sort ascending.
pub fn normalize_names<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = names
        .into_iter()
        .map(|n| n.as_ref().trim().to_string())
        .filter(|n| !n.is_empty())
        .collect();
    out.sort();
    out.dedup();
    out
}

/// One name per line, as pasted into the roster settings box.
pub fn parse_roster_text(text: &str) -> Vec<String> {
    normalize_names(csv::strip_bom(text).lines())
}

pub fn save_roster(workspace: &Path, names: &[String]) -> anyhow::Result<Vec<String>> {
    let normalized = normalize_names(names);
    std::fs::create_dir_all(workspace)
        .with_context(|| format!("failed to create directory {}", workspace.to_string_lossy()))?;
    let path = workspace.join(ROSTER_FILE);
    let rows: Vec<Vec<String>> = normalized.iter().map(|n| vec![n.clone()]).collect();
    std::fs::write(&path, csv::write_csv_bytes(&["name"], &rows))
        .with_context(|| format!("failed to write {}", path.to_string_lossy()))?;
    tracing::info!(path = %path.display(), students = normalized.len(), "saved roster");
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_dedupes_and_sorts() {
        let names = normalize_names(["  陳大文", "王小明", "", "陳大文", "  "]);
        assert_eq!(names, vec!["王小明".to_string(), "陳大文".to_string()]);
    }

    #[test]
    fn text_form_splits_lines() {
        let names = parse_roster_text("\u{feff}b\r\na\n\n c \n");
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn legacy_header_is_accepted() {
        let bytes = "\u{feff}姓名\n林一\n張二\n".as_bytes();
        let names = parse_roster(bytes).expect("parse roster");
        assert_eq!(names, vec!["張二".to_string(), "林一".to_string()]);
    }

    #[test]
    fn missing_name_column_is_an_error() {
        assert!(parse_roster(b"id\n1\n").is_err());
    }
}
