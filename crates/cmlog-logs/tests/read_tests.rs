use std::io::Cursor;

use chrono::{NaiveDate, NaiveDateTime};
use cmlog_logs::{
    CountLimit, LineParser, LogReader, LogSource, ParseError, RecordBudget, ReformatRegistry,
    TimeWindow, split_key_values, tail_lines,
};

fn cm_line(message: &str, time: &str, date: &str) -> String {
    format!(
        r#"<![LOG[{message}]LOG]!><time="{time}" date="{date}" component="CcmExec" context="" type="1" thread="3412" file="ccmexec.cpp:812">"#
    )
}

fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

#[test]
fn count_limit_spans_files() {
    let first = vec![
        cm_line("one", "10:00:00.000+000", "01-02-2024"),
        cm_line("two", "10:00:01.000+000", "01-02-2024"),
    ];
    let second = vec![
        cm_line("three", "10:00:02.000+000", "01-02-2024"),
        cm_line("four", "10:00:03.000+000", "01-02-2024"),
        cm_line("five", "10:00:04.000+000", "01-02-2024"),
    ];

    let reader = LogReader::default();
    let budget = RecordBudget::limited(CountLimit::new(3).unwrap());
    let a = LogSource::new("PC01", "CcmExec", "CcmExec.log");
    let b = LogSource::new("PC01", "CcmExec", "CcmExec-20240101-000000.log");

    let mut records = reader.read(&first, &a, &budget).unwrap();
    records.extend(reader.read(&second, &b, &budget).unwrap());

    let messages: Vec<&str> = records.iter().map(|r| r.message()).collect();
    assert_eq!(messages, vec!["one", "two", "three"]);
    assert_eq!(records[2].path(), b.path.as_path());
    assert!(budget.is_exhausted());

    // Later files in the same retrieval get nothing
    let third = vec![cm_line("six", "10:00:05.000+000", "01-02-2024")];
    assert!(reader.read(&third, &a, &budget).unwrap().is_empty());
}

#[test]
fn window_keeps_only_interior_timestamps() {
    let lines = vec![
        cm_line("t1", "08:00:00.000+060", "03-14-2024"),
        cm_line("t2", "09:00:00.000+060", "03-14-2024"),
        cm_line("t3", "10:00:00.000+060", "03-14-2024"),
    ];
    let window = TimeWindow::new(
        Some(ts(2024, 3, 14, 8, 0, 0)),
        Some(ts(2024, 3, 14, 10, 0, 0)),
    );
    let reader = LogReader::default().with_window(window);
    let origin = LogSource::new("PC01", "CcmExec", "CcmExec.log");

    let records = reader
        .read(&lines, &origin, &RecordBudget::unlimited())
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].timestamp(), ts(2024, 3, 14, 9, 0, 0));
}

#[test]
fn malformed_metadata_fails_the_file() {
    let lines = vec![
        cm_line("fine", "10:00:00.000+000", "01-02-2024"),
        "<![LOG[msg]LOG]!>".to_string(),
    ];
    let origin = LogSource::new("PC01", "CcmExec", "CcmExec.log");
    let err = LogReader::default()
        .read(&lines, &origin, &RecordBudget::unlimited())
        .unwrap_err();

    assert_eq!(err.line_number, 2);
    assert!(matches!(err.source, ParseError::MetadataExtraction { .. }));
}

#[test]
fn app_intent_eval_entries_are_split() {
    let lines = vec![cm_line(
        "ScopeId:- ScopeId_1, AppId:- Application_7",
        "11:22:33.444+000",
        "05-06-2024",
    )];
    let origin = LogSource::new("PC01", "AppIntentEval", "AppIntentEval.log");
    let records = LogReader::default()
        .read(&lines, &origin, &RecordBudget::unlimited())
        .unwrap();

    assert_eq!(records[0].message(), "ScopeId\nScopeId_1\nAppId\nApplication_7");
}

#[test]
fn custom_registry_extends_reformatting() {
    let mut registry = ReformatRegistry::with_defaults();
    registry.register("AppDiscovery", split_key_values);
    let reader = LogReader::new(LineParser::with_reformats(registry));

    let lines = vec![cm_line("Name:- 7-Zip, Version:- 23.01", "11:22:33.444+000", "05-06-2024")];
    let origin = LogSource::new("PC01", "AppDiscovery", "AppDiscovery.log");
    let records = reader
        .read(&lines, &origin, &RecordBudget::unlimited())
        .unwrap();

    assert_eq!(records[0].message(), "Name\n7-Zip\nVersion\n23.01");
}

#[test]
fn tail_then_read_reports_file_line_numbers() {
    let mut content = String::new();
    for i in 0..10 {
        content.push_str(&cm_line(&format!("entry {i}"), "12:00:00.000+000", "07-08-2024"));
        content.push('\n');
    }
    content.push_str("<![LOG[broken]LOG]!>\n");

    let tail = tail_lines(Cursor::new(content), Some(3)).unwrap();
    assert_eq!(tail.first_line_number, 9);

    let origin = LogSource::new("PC01", "CcmExec", "CcmExec.log");
    let reader = LogReader::default();
    let budget = RecordBudget::unlimited();
    let results: Vec<_> = reader
        .records(&tail.lines, &origin, &budget)
        .numbered_from(tail.first_line_number)
        .collect();

    assert_eq!(results.len(), 3);
    assert_eq!(results[0].as_ref().unwrap().message(), "entry 8");
    assert_eq!(results[2].as_ref().unwrap_err().line_number, 11);
}
