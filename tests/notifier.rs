//! Absence notifier behavior: fan-out, per-send failure isolation, skip
//! rules, and the record-then-notify end-to-end path.

use std::sync::Arc;

use sams::attendance::fake::{FakeMailer, FakeRecordStore, FakeRoster};
use sams::attendance::notifier::AbsenceNotifier;
use sams::attendance::reconciler::Reconciler;
use sams::attendance::store::RecordStore;
use sams::model::attendance::{AttendanceEntry, AttendanceStatus, NewAttendanceDay};
use sams::model::student::Student;

const TEACHER_ID: u64 = 7;

fn student(id: u64, code: &str, first: &str, last: &str, email: Option<&str>) -> Student {
    Student {
        id,
        student_code: code.to_owned(),
        first_name: first.to_owned(),
        last_name: last.to_owned(),
        grade: "5A".to_owned(),
        parent_name: Some(format!("{} {} Sr.", first, last)),
        parent_email: email.map(str::to_owned),
        parent_phone: None,
    }
}

fn entry(code: &str, status: AttendanceStatus) -> AttendanceEntry {
    AttendanceEntry {
        student_code: code.to_owned(),
        status,
    }
}

fn day(date: &str, grade: &str, entries: Vec<AttendanceEntry>) -> NewAttendanceDay {
    NewAttendanceDay {
        date: date.parse().unwrap(),
        grade: grade.to_owned(),
        recorded_by: TEACHER_ID,
        entries,
    }
}

struct Fixture {
    store: Arc<FakeRecordStore>,
    mailer: Arc<FakeMailer>,
    notifier: AbsenceNotifier,
}

fn setup(students: Vec<Student>) -> Fixture {
    let store = Arc::new(FakeRecordStore::new());
    let roster = Arc::new(FakeRoster::new(students, vec![TEACHER_ID]));
    let mailer = Arc::new(FakeMailer::new());
    let notifier = AbsenceNotifier::new(store.clone(), roster, mailer.clone());
    Fixture {
        store,
        mailer,
        notifier,
    }
}

#[tokio::test]
async fn no_absences_means_nothing_to_send() {
    let fx = setup(vec![student(
        1,
        "S1",
        "Mina",
        "Rahman",
        Some("g1@example.com"),
    )]);

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![entry("S1", AttendanceStatus::Present)],
        ))
        .await
        .unwrap();

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.failed, 0);
    // the mail collaborator must not have been touched at all
    assert_eq!(fx.mailer.attempts(), 0);
}

#[tokio::test]
async fn empty_date_has_nothing_to_send_either() {
    let fx = setup(Vec::new());

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 0);
    assert_eq!(outcome.failed, 0);
    assert_eq!(fx.mailer.attempts(), 0);
}

#[tokio::test]
async fn one_failed_send_does_not_block_the_rest() {
    let fx = setup(vec![
        student(1, "S1", "Mina", "Rahman", Some("g1@example.com")),
        student(2, "S2", "Arif", "Hossain", Some("g2@example.com")),
        student(3, "S3", "Lamia", "Akter", Some("g3@example.com")),
    ]);
    fx.mailer.fail_for("g2@example.com");

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![
                entry("S1", AttendanceStatus::Absent),
                entry("S2", AttendanceStatus::Absent),
                entry("S3", AttendanceStatus::Absent),
            ],
        ))
        .await
        .unwrap();

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 3);
    assert_eq!(outcome.failed, 1);

    // all three dispatches happened; the two good addresses got their mail
    assert_eq!(fx.mailer.attempts(), 3);
    let delivered: Vec<String> = fx.mailer.sent().into_iter().map(|m| m.to).collect();
    assert!(delivered.contains(&"g1@example.com".to_owned()));
    assert!(delivered.contains(&"g3@example.com".to_owned()));
}

#[tokio::test]
async fn unresolved_students_are_skipped_not_fatal() {
    let fx = setup(vec![student(
        1,
        "S1",
        "Mina",
        "Rahman",
        Some("g1@example.com"),
    )]);

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![
                entry("S1", AttendanceStatus::Absent),
                entry("GHOST", AttendanceStatus::Absent),
            ],
        ))
        .await
        .unwrap();

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    // only the resolvable student counts as attempted
    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.failed, 0);
    assert_eq!(fx.mailer.sent().len(), 1);
    assert_eq!(fx.mailer.sent()[0].to, "g1@example.com");
}

#[tokio::test]
async fn students_without_guardian_email_are_skipped() {
    let fx = setup(vec![
        student(1, "S1", "Mina", "Rahman", Some("g1@example.com")),
        student(2, "S2", "Arif", "Hossain", None),
        student(3, "S3", "Lamia", "Akter", Some("  ")),
    ]);

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![
                entry("S1", AttendanceStatus::Absent),
                entry("S2", AttendanceStatus::Absent),
                entry("S3", AttendanceStatus::Absent),
            ],
        ))
        .await
        .unwrap();

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.failed, 0);
    assert_eq!(fx.mailer.attempts(), 1);
}

#[tokio::test]
async fn absences_are_collected_across_all_grades() {
    let fx = setup(vec![
        student(1, "S1", "Mina", "Rahman", Some("g1@example.com")),
        student(2, "S4", "Rafi", "Islam", Some("g4@example.com")),
    ]);

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![entry("S1", AttendanceStatus::Absent)],
        ))
        .await
        .unwrap();
    fx.store
        .insert_day(day(
            "2024-03-01",
            "6B",
            vec![entry("S4", AttendanceStatus::Absent)],
        ))
        .await
        .unwrap();
    // a different date must not leak in
    fx.store
        .insert_day(day(
            "2024-03-02",
            "5A",
            vec![entry("S1", AttendanceStatus::Absent)],
        ))
        .await
        .unwrap();

    let outcome = fx.notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 2);
    assert_eq!(outcome.failed, 0);
}

#[tokio::test]
async fn message_template_addresses_the_guardian() {
    let fx = setup(vec![student(
        1,
        "S2",
        "Arif",
        "Hossain",
        Some("guardian@example.com"),
    )]);

    fx.store
        .insert_day(day(
            "2024-03-01",
            "5A",
            vec![entry("S2", AttendanceStatus::Absent)],
        ))
        .await
        .unwrap();

    fx.notifier.notify_absences("2024-03-01").await.unwrap();

    let sent = fx.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].subject.contains("Arif Hossain"));
    assert!(sent[0].subject.contains("2024-03-01"));
    assert!(sent[0].body.contains("Arif Hossain Sr."));
    assert!(sent[0].body.contains("marked absent on 2024-03-01"));
}

#[tokio::test]
async fn record_then_notify_end_to_end() {
    let store = Arc::new(FakeRecordStore::new());
    let roster = Arc::new(FakeRoster::new(
        vec![
            student(1, "S1", "Mina", "Rahman", Some("g1@example.com")),
            student(2, "S2", "Arif", "Hossain", Some("g2@example.com")),
        ],
        vec![TEACHER_ID],
    ));
    let mailer = Arc::new(FakeMailer::new());

    let reconciler = Reconciler::new(store.clone(), roster.clone());
    let notifier = AbsenceNotifier::new(store, roster, mailer.clone());

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

    let outcome = notifier.notify_absences("2024-03-01").await.unwrap();

    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.failed, 0);

    // exactly one dispatch, to the absent student's guardian
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "g2@example.com");
}
