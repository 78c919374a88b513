/// Attendance status labels, in the order the batch form offers them.
pub const STATUS_LABELS: [&str; 16] = [
    "準時",
    "遲未到",
    "遲后到",
    "無故曠課",
    "事假半日（上午）",
    "事假半日（下午）",
    "事假全日",
    "病假半日（上午）",
    "病假半日（下午）",
    "病假全日",
    "公假半日（上午）",
    "公假半日（下午）",
    "公假全日",
    "喪假半日（上午）",
    "喪假半日（下午）",
    "喪假全日",
];

/// Preselected status for every row of a new batch (on time).
pub const DEFAULT_STATUS: &str = STATUS_LABELS[0];

pub fn status_labels() -> &'static [&'static str] {
    &STATUS_LABELS
}

pub fn is_status_label(s: &str) -> bool {
    STATUS_LABELS.contains(&s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for label in STATUS_LABELS {
            assert!(seen.insert(label), "duplicate label {}", label);
        }
        assert_eq!(seen.len(), 16);
    }

    #[test]
    fn default_is_on_time() {
        assert_eq!(DEFAULT_STATUS, "準時");
        assert!(is_status_label(DEFAULT_STATUS));
        assert!(!is_status_label("present"));
        assert!(!is_status_label(""));
    }
}
