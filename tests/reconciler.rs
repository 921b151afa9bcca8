//! Reconciler behavior against the in-memory collaborator fakes: batch
//! commit semantics, conflict handling, date normalization, clearing.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::NaiveDate;

use sams::attendance::AttendanceError;
use sams::attendance::fake::{FakeRecordStore, FakeRoster};
use sams::attendance::store::RecordStore;
use sams::attendance::reconciler::{RecordStatus, Reconciler};
use sams::model::attendance::{AttendanceEntry, AttendanceStatus};
use sams::model::student::Student;

const TEACHER_ID: u64 = 7;

fn student(id: u64, code: &str, first: &str, last: &str, grade: &str) -> Student {
    Student {
        id,
        student_code: code.to_owned(),
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        grade: grade.to_owned(),
        parent_name: Some(format!("{} {} Sr.", first, last)),
        parent_email: Some(format!("{}@example.com", code.to_lowercase())),
        parent_phone: None,
    }
}

fn entry(code: &str, status: AttendanceStatus) -> AttendanceEntry {
    AttendanceEntry {
        student_code: code.to_owned(),
        status,
    }
}

fn roster_5a() -> Vec<Student> {
    vec![
        student(1, "S1", "Mina", "Rahman", "5A"),
        student(2, "S2", "Arif", "Hossain", "5A"),
        student(3, "S3", "Lamia", "Akter", "5A"),
    ]
}

fn setup(students: Vec<Student>) -> (Arc<FakeRecordStore>, Reconciler) {
    let store = Arc::new(FakeRecordStore::new());
    let roster = Arc::new(FakeRoster::new(students, vec![TEACHER_ID]));
    let reconciler = Reconciler::new(store.clone(), roster);
    (store, reconciler)
}

fn codes_of(entries: &[AttendanceEntry]) -> HashSet<String> {
    entries.iter().map(|e| e.student_code.clone()).collect()
}

#[tokio::test]
async fn first_submission_creates_the_day() {
    let (store, reconciler) = setup(roster_5a());

    let batch = vec![
        entry("S1", AttendanceStatus::Present),
        entry("S2", AttendanceStatus::Absent),
    ];

    let outcome = reconciler
        .record_attendance("2024-03-01", "5A", &batch, TEACHER_ID)
        .await
        .unwrap();

    assert_eq!(outcome.status, RecordStatus::Created);
    assert_eq!(outcome.record.grade, "5A");
    assert_eq!(outcome.record.recorded_by, TEACHER_ID);
    assert_eq!(codes_of(&outcome.record.entries), codes_of(&batch));

    // the store holds exactly what was submitted
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stored = store.find_day(day, "5A").await.unwrap().unwrap();
    assert_eq!(codes_of(&stored.entries), codes_of(&batch));
}

#[tokio::test]
async fn disjoint_second_batch_appends_to_the_same_day() {
    let (store, reconciler) = setup(roster_5a());

    reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[
                entry("S1", AttendanceStatus::Present),
                entry("S2", AttendanceStatus::Absent),
            ],
            TEACHER_ID,
        )
        .await
        .unwrap();

    let outcome = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S3", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RecordStatus::Updated);
    assert_eq!(
        codes_of(&outcome.record.entries),
        HashSet::from(["S1".to_owned(), "S2".to_owned(), "S3".to_owned()])
    );

    // still one day, three unique entries
    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stored = store.find_day(day, "5A").await.unwrap().unwrap();
    assert_eq!(stored.entries.len(), 3);
}

#[tokio::test]
async fn overlapping_batch_is_rejected_whole_and_store_is_unchanged() {
    let (store, reconciler) = setup(roster_5a());

    let original = vec![
        entry("S1", AttendanceStatus::Present),
        entry("S2", AttendanceStatus::Absent),
    ];
    reconciler
        .record_attendance("2024-03-01", "5A", &original, TEACHER_ID)
        .await
        .unwrap();

    // S2 overlaps; S3 would be new, but the whole batch must be refused
    let err = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[
                entry("S3", AttendanceStatus::Present),
                entry("S2", AttendanceStatus::Present),
            ],
            TEACHER_ID,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Conflict(_)));

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let stored = store.find_day(day, "5A").await.unwrap().unwrap();
    assert_eq!(codes_of(&stored.entries), codes_of(&original));
}

#[tokio::test]
async fn duplicate_student_within_batch_fails_before_any_write() {
    let (store, reconciler) = setup(roster_5a());

    let err = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[
                entry("S1", AttendanceStatus::Present),
                entry("S1", AttendanceStatus::Absent),
            ],
            TEACHER_ID,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Conflict(_)));

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert!(store.find_day(day, "5A").await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_teacher_is_rejected_before_any_write() {
    let (store, reconciler) = setup(roster_5a());

    let err = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            999,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::NotFound(_)));

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    assert!(store.find_day(day, "5A").await.unwrap().is_none());
}

#[tokio::test]
async fn missing_fields_are_validation_errors() {
    let (_, reconciler) = setup(roster_5a());
    let batch = vec![entry("S1", AttendanceStatus::Present)];

    for (date, grade, entries) in [
        ("", "5A", batch.as_slice()),
        ("2024-03-01", "  ", batch.as_slice()),
        ("2024-03-01", "5A", &[] as &[AttendanceEntry]),
    ] {
        let err = reconciler
            .record_attendance(date, grade, entries, TEACHER_ID)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Validation(_)));
    }
}

#[tokio::test]
async fn blank_student_code_is_an_incomplete_record() {
    let (_, reconciler) = setup(roster_5a());

    let err = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[
                entry("S1", AttendanceStatus::Present),
                entry("  ", AttendanceStatus::Absent),
            ],
            TEACHER_ID,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Validation(_)));
}

#[tokio::test]
async fn unparsable_date_is_a_validation_error() {
    let (_, reconciler) = setup(roster_5a());

    let err = reconciler
        .record_attendance(
            "first of March",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AttendanceError::Validation(_)));
}

#[tokio::test]
async fn timestamped_submissions_collide_on_the_utc_day() {
    let (_, reconciler) = setup(roster_5a());

    // 10:00 +02:00 is 08:00 UTC, still March 1st
    reconciler
        .record_attendance(
            "2024-03-01T10:00:00+02:00",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    // a plain-date submission for the same day must hit the same record
    let outcome = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S2", AttendanceStatus::Absent)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    assert_eq!(outcome.status, RecordStatus::Updated);

    // and a same-day query from yet another offset retrieves it
    let days = reconciler
        .query_attendance("2024-03-01T23:00:00+01:00", Some("5A"))
        .await
        .unwrap();
    assert_eq!(days.len(), 1);
    assert_eq!(days[0].entries.len(), 2);
}

#[tokio::test]
async fn query_resolves_names_and_placeholders_unknown_students() {
    let (_, reconciler) = setup(vec![student(1, "S1", "Mina", "Rahman", "5A")]);

    reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[
                entry("S1", AttendanceStatus::Present),
                entry("GHOST", AttendanceStatus::Absent),
            ],
            TEACHER_ID,
        )
        .await
        .unwrap();

    let days = reconciler
        .query_attendance("2024-03-01", None)
        .await
        .unwrap();
    assert_eq!(days.len(), 1);

    let names: Vec<(&str, &str)> = days[0]
        .entries
        .iter()
        .map(|e| (e.student_code.as_str(), e.student_name.as_str()))
        .collect();

    assert!(names.contains(&("S1", "Mina Rahman")));
    assert!(names.contains(&("GHOST", "unknown student")));
}

#[tokio::test]
async fn query_honors_the_grade_filter() {
    let mut students = roster_5a();
    students.push(student(4, "S4", "Rafi", "Islam", "6B"));
    let (_, reconciler) = setup(students);

    reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    reconciler
        .record_attendance(
            "2024-03-01",
            "6B",
            &[entry("S4", AttendanceStatus::Absent)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    let filtered = reconciler
        .query_attendance("2024-03-01", Some("6B"))
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0].grade, "6B");

    let all = reconciler
        .query_attendance("2024-03-01", None)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn grades_are_independent_days() {
    let mut students = roster_5a();
    students.push(student(4, "S4", "Rafi", "Islam", "6B"));
    let (_, reconciler) = setup(students);

    let first = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    let second = reconciler
        .record_attendance(
            "2024-03-01",
            "6B",
            &[entry("S4", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    // same date, different grade: both are fresh days
    assert_eq!(first.status, RecordStatus::Created);
    assert_eq!(second.status, RecordStatus::Created);
}

#[tokio::test]
async fn clear_attendance_is_idempotent_and_counts_days() {
    let mut students = roster_5a();
    students.push(student(4, "S4", "Rafi", "Islam", "6B"));
    let (_, reconciler) = setup(students);

    // clearing an empty date is a zero-count success
    assert_eq!(reconciler.clear_attendance("2024-03-01").await.unwrap(), 0);

    reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    reconciler
        .record_attendance(
            "2024-03-01",
            "6B",
            &[entry("S4", AttendanceStatus::Absent)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    // a neighboring date must survive the purge
    reconciler
        .record_attendance(
            "2024-03-02",
            "5A",
            &[entry("S2", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    assert_eq!(reconciler.clear_attendance("2024-03-01").await.unwrap(), 2);
    assert!(
        reconciler
            .query_attendance("2024-03-01", None)
            .await
            .unwrap()
            .is_empty()
    );
    assert_eq!(
        reconciler
            .query_attendance("2024-03-02", None)
            .await
            .unwrap()
            .len(),
        1
    );

    // second purge finds nothing, still success
    assert_eq!(reconciler.clear_attendance("2024-03-01").await.unwrap(), 0);
}

#[tokio::test]
async fn re_recording_after_clear_starts_a_fresh_day() {
    let (_, reconciler) = setup(roster_5a());

    reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Absent)],
            TEACHER_ID,
        )
        .await
        .unwrap();
    reconciler.clear_attendance("2024-03-01").await.unwrap();

    // corrections go through delete-and-recreate, not in-place edits
    let outcome = reconciler
        .record_attendance(
            "2024-03-01",
            "5A",
            &[entry("S1", AttendanceStatus::Present)],
            TEACHER_ID,
        )
        .await
        .unwrap();

    assert_eq!(outcome.status, RecordStatus::Created);
    assert_eq!(outcome.record.entries[0].status, AttendanceStatus::Present);
}
