//! In-memory collaborator fakes used by the integration tests. Faithful to
//! the trait contracts: the fake store rejects duplicate appends exactly like
//! the UNIQUE key in the MySQL backend does.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::AttendanceError;
use super::mailer::Mailer;
use super::roster::Roster;
use super::store::RecordStore;
use crate::model::attendance::{AttendanceDay, AttendanceEntry, NewAttendanceDay};
use crate::model::student::Student;

#[derive(Default)]
pub struct FakeRecordStore {
    days: Mutex<Vec<AttendanceDay>>,
    next_id: AtomicU64,
}

impl FakeRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for FakeRecordStore {
    async fn find_day(
        &self,
        date: NaiveDate,
        grade: &str,
    ) -> Result<Option<AttendanceDay>, AttendanceError> {
        let days = self.days.lock().expect("fake store poisoned");
        Ok(days
            .iter()
            .find(|d| d.date == date && d.grade == grade)
            .cloned())
    }

    async fn insert_day(&self, day: NewAttendanceDay) -> Result<AttendanceDay, AttendanceError> {
        let mut days = self.days.lock().expect("fake store poisoned");

        if days.iter().any(|d| d.date == day.date && d.grade == day.grade) {
            return Err(AttendanceError::conflict(
                "attendance already recorded for this grade and date",
            ));
        }

        let record = AttendanceDay {
            id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
            date: day.date,
            grade: day.grade,
            recorded_by: day.recorded_by,
            entries: day.entries,
        };
        days.push(record.clone());

        Ok(record)
    }

    async fn append_entries(
        &self,
        date: NaiveDate,
        grade: &str,
        entries: &[AttendanceEntry],
    ) -> Result<AttendanceDay, AttendanceError> {
        let mut days = self.days.lock().expect("fake store poisoned");

        let Some(day) = days.iter_mut().find(|d| d.date == date && d.grade == grade) else {
            return Err(AttendanceError::not_found("attendance day not found"));
        };

        // Check the whole batch before touching the record, so a conflict
        // never leaves a partial append behind.
        let present: HashSet<&str> = day.entries.iter().map(|e| e.student_code.as_str()).collect();
        if entries
            .iter()
            .any(|e| present.contains(e.student_code.as_str()))
        {
            return Err(AttendanceError::conflict(
                "attendance already recorded for one or more students on this date",
            ));
        }

        day.entries.extend(entries.iter().cloned());
        Ok(day.clone())
    }

    async fn find_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        grade: Option<&str>,
    ) -> Result<Vec<AttendanceDay>, AttendanceError> {
        let days = self.days.lock().expect("fake store poisoned");
        Ok(days
            .iter()
            .filter(|d| d.date >= start && d.date < end)
            .filter(|d| grade.is_none_or(|g| d.grade == g))
            .cloned()
            .collect())
    }

    async fn delete_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, AttendanceError> {
        let mut days = self.days.lock().expect("fake store poisoned");
        let before = days.len();
        days.retain(|d| d.date < start || d.date >= end);
        Ok((before - days.len()) as u64)
    }
}

#[derive(Default)]
pub struct FakeRoster {
    students: Vec<Student>,
    teacher_ids: Vec<u64>,
}

impl FakeRoster {
    pub fn new(students: Vec<Student>, teacher_ids: Vec<u64>) -> Self {
        Self {
            students,
            teacher_ids,
        }
    }
}

#[async_trait]
impl Roster for FakeRoster {
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Student>, AttendanceError> {
        Ok(self
            .students
            .iter()
            .filter(|s| codes.contains(&s.student_code))
            .cloned()
            .collect())
    }

    async fn teacher_exists(&self, teacher_id: u64) -> Result<bool, AttendanceError> {
        Ok(self.teacher_ids.contains(&teacher_id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Records every accepted send; addresses registered via [`fail_for`] reject
/// instead, simulating a bad guardian address.
///
/// [`fail_for`]: FakeMailer::fail_for
#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<SentMail>>,
    failing: Mutex<HashSet<String>>,
    attempts: AtomicU64,
}

impl FakeMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_for(&self, address: &str) {
        self.failing
            .lock()
            .expect("fake mailer poisoned")
            .insert(address.to_owned());
    }

    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().expect("fake mailer poisoned").clone()
    }

    /// Total send calls, including rejected ones.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::Relaxed);

        if self
            .failing
            .lock()
            .expect("fake mailer poisoned")
            .contains(to)
        {
            anyhow::bail!("simulated delivery failure to {to}");
        }

        self.sent.lock().expect("fake mailer poisoned").push(SentMail {
            to: to.to_owned(),
            subject: subject.to_owned(),
            body: body.to_owned(),
        });

        Ok(())
    }
}
