//! Integration tests reading a complete MSPDI export from disk

use chrono::NaiveDate;
use mppgantt_core::{Project, TaskUid};
use mppgantt_reader::{detect_format, read_project, FileFormat, ReadError};
use pretty_assertions::assert_eq;
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn office_move() -> Project {
    read_project(&fixture("office_move.xml")).unwrap()
}

#[test]
fn fixture_is_detected_as_mspdi() {
    let bytes = std::fs::read(fixture("office_move.xml")).unwrap();
    assert_eq!(detect_format(&bytes), FileFormat::MspdiXml);
}

#[test]
fn header_fields() {
    let project = office_move();
    assert_eq!(project.name, "office_move.xml");
    assert_eq!(project.start, Some(date(2025, 4, 1)));
    assert_eq!(project.finish, Some(date(2025, 5, 2)));
}

#[test]
fn walk_order_and_depths() {
    let project = office_move();
    let rows: Vec<(i64, &str, usize)> = project
        .walk()
        .iter()
        .map(|f| (f.task.display_id(), f.task.name.as_str(), f.depth))
        .collect();

    assert_eq!(
        rows,
        vec![
            (1, "Planning", 0),
            (2, "Site survey", 1),
            (3, "Floor plan & seating", 1),
            (5, "Move", 0),
            (6, "Packing", 1),
            (7, "IT cutover", 1),
            (8, "Network", 2),
            (9, "Go live", 1),
        ]
    );
}

#[test]
fn summary_flags_follow_children() {
    let project = office_move();
    let summaries: Vec<TaskUid> = project
        .walk()
        .iter()
        .filter(|f| f.task.is_summary())
        .map(|f| f.task.uid)
        .collect();
    assert_eq!(summaries, vec![1, 4, 6]);
}

#[test]
fn resources_and_progress() {
    let project = office_move();

    let survey = project.get_task(2).unwrap();
    assert_eq!(survey.resource_label(), "Aiko Tanaka");
    assert_eq!(survey.actual_finish, Some(date(2025, 4, 3)));
    assert_eq!(survey.start, Some(date(2025, 4, 1)));

    let plan = project.get_task(3).unwrap();
    assert_eq!(plan.resource_label(), "Aiko Tanaka, Facilities");
    assert_eq!(plan.done_ratio(), 0.6);

    let go_live = project.get_task(8).unwrap();
    assert!(go_live.milestone);
    assert!(go_live.resources.is_empty());
}

#[test]
fn date_span_covers_leaf_tasks() {
    assert_eq!(
        office_move().date_span(),
        Some((date(2025, 4, 1), date(2025, 5, 2)))
    );
}

#[test]
fn mpp_file_on_disk_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.mpp");
    let mut bytes = vec![0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
    bytes.resize(1024, 0);
    std::fs::write(&path, bytes).unwrap();

    let err = read_project(&path).unwrap_err();
    assert!(matches!(err, ReadError::UnsupportedFormat(_)));
}
