#[path = "../src/csv.rs"]
mod csv;
#[path = "../src/records.rs"]
mod records;
#[path = "../src/status.rs"]
mod status;

use chrono::NaiveDate;
use records::{AttendanceEntry, BatchError, BatchSubmission, RecordStore, RECORDS_FILE};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).expect("valid date")
}

fn sample_entries() -> Vec<AttendanceEntry> {
    vec![
        AttendanceEntry::new(d(2026, 1, 1), "王小明", "準時", ""),
        AttendanceEntry::new(d(2026, 1, 1), "陳大文", "病假半日（上午）", "看牙醫, 下午返校"),
        AttendanceEntry::new(d(2026, 1, 2), "林\"阿\"美", "遲后到", "第一節\n補登"),
    ]
}

#[test]
fn persist_then_load_roundtrips_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    let entries = sample_entries();

    records::persist_records(&path, &entries).expect("persist");
    let loaded = records::load_records(&path);

    assert_eq!(loaded.entries, entries);
    assert_eq!(loaded.dropped_rows, 0);
    assert!(!loaded.degraded);

    let bytes = std::fs::read(&path).expect("read back");
    assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF], "file starts with a BOM");
    let text = String::from_utf8(bytes).expect("utf8");
    assert!(text.starts_with("\u{feff}date,student_name,status,note\n"));
}

#[test]
fn missing_file_loads_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let loaded = records::load_records(&dir.path().join(RECORDS_FILE));
    assert!(loaded.entries.is_empty());
    assert_eq!(loaded.dropped_rows, 0);
    assert!(!loaded.degraded);
}

#[test]
fn bad_date_rows_are_dropped_and_counted() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    std::fs::write(
        &path,
        "\u{feff}date,student_name,status,note\nnot-a-date,王小明,準時,\n2026-01-05,王小明,事假全日,家事\n",
    )
    .expect("write");

    let loaded = records::load_records(&path);
    assert_eq!(
        loaded.entries,
        vec![AttendanceEntry::new(d(2026, 1, 5), "王小明", "事假全日", "家事")]
    );
    assert_eq!(loaded.dropped_rows, 1);
    assert!(!loaded.degraded);
}

#[test]
fn unparseable_file_degrades_to_empty() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);

    std::fs::write(&path, [0xFF, 0xFE, 0x00, 0x41]).expect("write binary junk");
    let loaded = records::load_records(&path);
    assert!(loaded.entries.is_empty());
    assert!(loaded.degraded);

    std::fs::write(&path, "date,student_name\n\"2026-01-01,王小明\n").expect("write open quote");
    assert!(records::load_records(&path).degraded);

    std::fs::write(&path, "foo,bar\n1,2\n").expect("write wrong header");
    assert!(records::load_records(&path).degraded);

    std::fs::write(&path, "").expect("write empty");
    assert!(records::load_records(&path).degraded);
}

#[test]
fn legacy_chinese_header_and_datetime_values_load() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    std::fs::write(
        &path,
        "\u{feff}日期,學生姓名,狀態,備註\n2026-02-10 00:00:00,王小明,準時,\n2026/02/11,王小明,遲未到,塞車\n",
    )
    .expect("write");

    let loaded = records::load_records(&path);
    assert_eq!(
        loaded.entries,
        vec![
            AttendanceEntry::new(d(2026, 2, 10), "王小明", "準時", ""),
            AttendanceEntry::new(d(2026, 2, 11), "王小明", "遲未到", "塞車"),
        ]
    );
}

#[test]
fn short_rows_read_blank_and_long_rows_are_dropped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    std::fs::write(
        &path,
        "date,student_name,status,note\n2026-03-02,王小明\n2026-03-02,陳大文,準時,,extra\n",
    )
    .expect("write");

    let loaded = records::load_records(&path);
    assert_eq!(
        loaded.entries,
        vec![AttendanceEntry::new(d(2026, 3, 2), "王小明", "", "")]
    );
    assert_eq!(loaded.dropped_rows, 1);
}

#[test]
fn unknown_status_on_disk_is_kept() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    std::fs::write(&path, "date,student_name,status,note\n2025-12-01,舊生,請假,\n").expect("write");
    let loaded = records::load_records(&path);
    assert_eq!(loaded.entries[0].status, "請假");
}

#[test]
fn append_and_persist_preserves_order() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    let e1 = sample_entries();
    let e2 = vec![
        AttendanceEntry::new(d(2026, 1, 3), "王小明", "無故曠課", ""),
        AttendanceEntry::new(d(2025, 12, 31), "陳大文", "準時", "補登"),
    ];

    records::append_and_persist(&path, &e1, &e2).expect("append");
    let loaded = records::load_records(&path).entries;

    let mut expected = e1.clone();
    expected.extend(e2);
    assert_eq!(loaded, expected);
}

#[test]
fn duplicate_student_day_rows_are_not_deduped() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    let row = AttendanceEntry::new(d(2026, 1, 1), "王小明", "準時", "");
    records::append_and_persist(&path, &[row.clone()], &[row.clone()]).expect("append");
    assert_eq!(records::load_records(&path).entries, vec![row.clone(), row]);
}

#[test]
fn write_failure_propagates() {
    let dir = tempfile::tempdir().expect("tempdir");
    // A directory where the file should be makes the write fail.
    let path = dir.path().join(RECORDS_FILE);
    std::fs::create_dir_all(&path).expect("mkdir");
    let err = records::append_and_persist(&path, &[], &sample_entries());
    assert!(err.is_err());
}

#[test]
fn batch_save_for_three_students_on_empty_store() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = RecordStore::open(dir.path());
    assert!(store.entries().is_empty());

    let roster = vec!["張三".to_string(), "李四".to_string(), "王五".to_string()];
    let date = d(2026, 2, 10);
    let submissions = vec![
        BatchSubmission {
            student_name: "李四".to_string(),
            status: "病假全日".to_string(),
            note: "發燒".to_string(),
        },
        BatchSubmission {
            student_name: "王五".to_string(),
            status: "遲未到".to_string(),
            note: String::new(),
        },
    ];
    let batch = records::build_batch(date, &roster, &submissions).expect("build batch");
    assert_eq!(store.save_batch(&batch).expect("save"), 3);

    let expected = vec![
        AttendanceEntry::new(date, "張三", "準時", ""),
        AttendanceEntry::new(date, "李四", "病假全日", "發燒"),
        AttendanceEntry::new(date, "王五", "遲未到", ""),
    ];
    assert_eq!(store.entries(), expected.as_slice());

    let reopened = RecordStore::open(dir.path());
    assert_eq!(reopened.entries(), expected.as_slice());
}

#[test]
fn build_batch_rejects_bad_input() {
    let date = d(2026, 2, 10);
    let roster = vec!["張三".to_string()];

    assert_eq!(
        records::build_batch(date, &[], &[]),
        Err(BatchError::EmptyRoster)
    );

    let stranger = BatchSubmission {
        student_name: "路人".to_string(),
        status: "準時".to_string(),
        note: String::new(),
    };
    assert_eq!(
        records::build_batch(date, &roster, &[stranger]),
        Err(BatchError::UnknownStudent("路人".to_string()))
    );

    let bad_status = BatchSubmission {
        student_name: "張三".to_string(),
        status: "present".to_string(),
        note: String::new(),
    };
    assert!(matches!(
        records::build_batch(date, &roster, &[bad_status]),
        Err(BatchError::UnknownStatus { .. })
    ));
}

#[test]
fn reload_picks_up_external_changes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut store = RecordStore::open(dir.path());
    records::persist_records(store.path(), &sample_entries()).expect("persist");
    assert!(store.entries().is_empty());
    store.reload();
    assert_eq!(store.entries().len(), 3);
}

#[test]
fn stray_quote_inside_note_keeps_history() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join(RECORDS_FILE);
    std::fs::write(
        &path,
        "\u{feff}date,student_name,status,note\n2026-01-05,王小明,準時,身高5\"\n2026-01-05,陳大文,準時,\n2026-01-06,王小明,事假全日,家事\n",
    )
    .expect("write hand-edited file");

    let mut store = RecordStore::open(dir.path());
    assert!(!store.is_degraded());
    assert_eq!(store.dropped_rows(), 0);
    assert_eq!(store.entries().len(), 3);
    assert_eq!(store.entries()[0].note, "身高5\"");

    let batch = vec![AttendanceEntry::new(d(2026, 1, 7), "陳大文", "遲后到", "")];
    assert_eq!(store.save_batch(&batch).expect("save"), 1);

    let reopened = records::load_records(&path);
    assert!(!reopened.degraded);
    assert_eq!(reopened.entries.len(), 4);
    assert_eq!(reopened.entries[0].note, "身高5\"");
    assert_eq!(reopened.entries[2].status, "事假全日");
}
