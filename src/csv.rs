//! Delimited-text codec shared by the record store, the roster file and the
//! report exports.
//!
//! Files are UTF-8 with a leading byte-order mark so spreadsheet tools pick
//! the right encoding. Quoting follows the usual CSV rules: a field holding a
//! comma, quote or line break is wrapped in quotes and inner quotes doubled.

use anyhow::{anyhow, Context};

pub const UTF8_BOM: char = '\u{feff}';

pub fn csv_quote(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn strip_bom(text: &str) -> &str {
    text.strip_prefix(UTF8_BOM).unwrap_or(text)
}

/// Decode file bytes as UTF-8, dropping a leading BOM.
pub fn decode_text(bytes: &[u8]) -> anyhow::Result<String> {
    let text = std::str::from_utf8(bytes).context("file is not valid UTF-8")?;
    Ok(strip_bom(text).to_string())
}

/// Split a whole document into records. Quoted fields may span lines.
/// A quote only opens a quoted field as the field's first character; anywhere
/// else it is literal text. Physical lines with no content at all are skipped.
pub fn parse_csv_text(text: &str) -> anyhow::Result<Vec<Vec<String>>> {
    let text = strip_bom(text);
    let mut records: Vec<Vec<String>> = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut in_quotes = false;
    let mut touched = false;
    let mut field_started = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    buf.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                buf.push(ch);
            }
            continue;
        }
        match ch {
            '"' if !field_started => {
                in_quotes = true;
                touched = true;
                field_started = true;
            }
            ',' => {
                record.push(std::mem::take(&mut buf));
                touched = true;
                field_started = false;
            }
            '\r' | '\n' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                if touched || !buf.is_empty() {
                    record.push(std::mem::take(&mut buf));
                    records.push(std::mem::take(&mut record));
                }
                touched = false;
                field_started = false;
            }
            _ => {
                buf.push(ch);
                field_started = true;
            }
        }
    }

    if in_quotes {
        return Err(anyhow!(
            "unterminated quoted field in record {}",
            records.len() + 1
        ));
    }
    if touched || !buf.is_empty() {
        record.push(buf);
        records.push(record);
    }
    Ok(records)
}

/// Render a header plus rows as BOM-prefixed UTF-8 bytes.
pub fn write_csv_bytes(header: &[&str], rows: &[Vec<String>]) -> Vec<u8> {
    let mut out = String::new();
    out.push(UTF8_BOM);
    let head: Vec<String> = header.iter().map(|h| csv_quote(h)).collect();
    out.push_str(&head.join(","));
    out.push('\n');
    for row in rows {
        let fields: Vec<String> = row.iter().map(|f| csv_quote(f)).collect();
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out.into_bytes()
}

/// Find the index of the first header cell matching any of `names`.
pub fn column_index(header: &[String], names: &[&str]) -> Option<usize> {
    header
        .iter()
        .position(|h| names.iter().any(|n| h.trim() == *n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_only_when_needed() {
        assert_eq!(csv_quote("準時"), "準時");
        assert_eq!(csv_quote("a,b"), "\"a,b\"");
        assert_eq!(csv_quote("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(csv_quote("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn parse_handles_quotes_crlf_and_blank_lines() {
        let text = "\u{feff}a,b\r\n\r\n\"x,1\",\"he said \"\"no\"\"\"\r\n\"multi\nline\",\n";
        let rows = parse_csv_text(text).expect("parse");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b".to_string()],
                vec!["x,1".to_string(), "he said \"no\"".to_string()],
                vec!["multi\nline".to_string(), String::new()],
            ]
        );
    }

    #[test]
    fn parse_keeps_last_record_without_newline() {
        let rows = parse_csv_text("h\nv").expect("parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["v".to_string()]);
    }

    #[test]
    fn quote_inside_unquoted_field_is_literal() {
        let rows = parse_csv_text("a,身高5\"\nb,x\"y\"z\n\"q\"tail,c\n").expect("parse");
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "身高5\"".to_string()],
                vec!["b".to_string(), "x\"y\"z".to_string()],
                vec!["qtail".to_string(), "c".to_string()],
            ]
        );
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        assert!(parse_csv_text("a,b\n\"open,1\n").is_err());
    }

    #[test]
    fn written_bytes_start_with_bom_and_parse_back() {
        let bytes = write_csv_bytes(
            &["name", "note"],
            &[vec!["王小明".to_string(), "遲到, 已補".to_string()]],
        );
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = decode_text(&bytes).expect("utf8");
        let rows = parse_csv_text(&text).expect("parse");
        assert_eq!(rows[1], vec!["王小明".to_string(), "遲到, 已補".to_string()]);
    }

    #[test]
    fn column_lookup_accepts_aliases() {
        let header = vec!["日期".to_string(), " name ".to_string()];
        assert_eq!(column_index(&header, &["date", "日期"]), Some(0));
        assert_eq!(column_index(&header, &["name"]), Some(1));
        assert_eq!(column_index(&header, &["note"]), None);
    }
}
