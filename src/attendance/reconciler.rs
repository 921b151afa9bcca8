use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::dates::{day_bounds, normalize_date};
use super::error::AttendanceError;
use super::roster::Roster;
use super::store::RecordStore;
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus, NewAttendanceDay};

/// Display name substituted when a roster lookup cannot resolve a code.
const UNKNOWN_STUDENT: &str = "unknown student";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Created,
    Updated,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordOutcome {
    #[schema(example = "created")]
    pub status: RecordStatus,
    pub record: AttendanceDay,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceEntryView {
    #[schema(example = "STU-0001")]
    pub student_code: String,
    #[schema(example = "Mina Rahman")]
    pub student_name: String,
    #[schema(example = "Present")]
    pub status: AttendanceStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceDayView {
    pub id: u64,
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub date: chrono::NaiveDate,
    #[schema(example = "5A")]
    pub grade: String,
    pub recorded_by: u64,
    pub entries: Vec<AttendanceEntryView>,
}

/// Enforces "at most one status per student per (date, grade)" across
/// possibly multiple submission batches.
pub struct Reconciler {
    store: Arc<dyn RecordStore>,
    roster: Arc<dyn Roster>,
}

impl Reconciler {
    pub fn new(store: Arc<dyn RecordStore>, roster: Arc<dyn Roster>) -> Self {
        Self { store, roster }
    }

    /// Commit a batch of entries for one (date, grade), exactly once per
    /// student. All-or-nothing: any conflict rejects the whole batch and
    /// leaves the stored record untouched.
    pub async fn record_attendance(
        &self,
        date: &str,
        grade: &str,
        entries: &[AttendanceEntry],
        recorded_by: u64,
    ) -> Result<RecordOutcome, AttendanceError> {
        if date.trim().is_empty() || grade.trim().is_empty() || entries.is_empty() {
            return Err(AttendanceError::validation("missing required fields"));
        }

        if !self.roster.teacher_exists(recorded_by).await? {
            return Err(AttendanceError::not_found("teacher not found"));
        }

        if entries.iter().any(|e| e.student_code.trim().is_empty()) {
            return Err(AttendanceError::validation("incomplete record"));
        }

        let mut seen = HashSet::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.student_code.as_str()) {
                return Err(AttendanceError::conflict("duplicate student in submission"));
            }
        }

        let day = normalize_date(date)?;

        match self.store.find_day(day, grade).await? {
            None => {
                let record = self
                    .store
                    .insert_day(NewAttendanceDay {
                        date: day,
                        grade: grade.to_owned(),
                        recorded_by,
                        entries: entries.to_vec(),
                    })
                    .await?;

                info!(
                    date = %day,
                    grade,
                    recorded_by,
                    count = entries.len(),
                    "Attendance day created"
                );

                Ok(RecordOutcome {
                    status: RecordStatus::Created,
                    record,
                })
            }
            Some(existing) => {
                let present: HashSet<&str> = existing
                    .entries
                    .iter()
                    .map(|e| e.student_code.as_str())
                    .collect();

                if entries
                    .iter()
                    .any(|e| present.contains(e.student_code.as_str()))
                {
                    return Err(AttendanceError::conflict(
                        "attendance already recorded for one or more students on this date",
                    ));
                }

                // The store re-checks under its own lock; a racing batch for
                // the same students surfaces here as a conflict, never as a
                // partial append.
                let record = self.store.append_entries(day, grade, entries).await?;

                info!(
                    date = %day,
                    grade,
                    recorded_by,
                    appended = entries.len(),
                    total = record.entries.len(),
                    "Attendance day updated"
                );

                Ok(RecordOutcome {
                    status: RecordStatus::Updated,
                    record,
                })
            }
        }
    }

    /// All attendance days for a date (optionally one grade), entries
    /// expanded with display names. Name resolution is best-effort: missing
    /// roster rows fall back to a placeholder rather than failing the query.
    pub async fn query_attendance(
        &self,
        date: &str,
        grade: Option<&str>,
    ) -> Result<Vec<AttendanceDayView>, AttendanceError> {
        if date.trim().is_empty() {
            return Err(AttendanceError::validation("missing required fields"));
        }

        let day = normalize_date(date)?;
        let (start, end) = day_bounds(day);

        let days = self.store.find_range(start, end, grade).await?;

        let codes: Vec<String> = days
            .iter()
            .flat_map(|d| d.entries.iter().map(|e| e.student_code.clone()))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let names: HashMap<String, String> = match self.roster.find_by_codes(&codes).await {
            Ok(students) => students
                .into_iter()
                .map(|s| (s.student_code.clone(), s.display_name()))
                .collect(),
            Err(e) => {
                warn!(error = %e, "Roster lookup failed; returning placeholder names");
                HashMap::new()
            }
        };

        Ok(days
            .into_iter()
            .map(|d| AttendanceDayView {
                id: d.id,
                date: d.date,
                grade: d.grade,
                recorded_by: d.recorded_by,
                entries: d
                    .entries
                    .into_iter()
                    .map(|e| AttendanceEntryView {
                        student_name: names
                            .get(&e.student_code)
                            .cloned()
                            .unwrap_or_else(|| UNKNOWN_STUDENT.to_owned()),
                        student_code: e.student_code,
                        status: e.status,
                    })
                    .collect(),
            })
            .collect())
    }

    /// Delete every attendance day on the given date. Idempotent: deleting
    /// nothing is a zero-count success.
    pub async fn clear_attendance(&self, date: &str) -> Result<u64, AttendanceError> {
        if date.trim().is_empty() {
            return Err(AttendanceError::validation("missing required fields"));
        }

        let day = normalize_date(date)?;
        let (start, end) = day_bounds(day);

        let deleted = self.store.delete_range(start, end).await?;
        info!(date = %day, deleted, "Attendance cleared");

        Ok(deleted)
    }
}
