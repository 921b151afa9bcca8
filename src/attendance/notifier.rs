use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::NaiveDate;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::dates::{day_bounds, normalize_date};
use super::error::AttendanceError;
use super::mailer::Mailer;
use super::roster::Roster;
use super::store::RecordStore;
use crate::model::attendance::AttendanceStatus;
use crate::model::student::Student;

#[derive(Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct NotifyOutcome {
    #[schema(example = 3)]
    pub attempted: usize,
    #[schema(example = 1)]
    pub failed: usize,
}

struct AbsenceMessage {
    to: String,
    subject: String,
    body: String,
}

fn absence_message(student: &Student, to: String, date: NaiveDate) -> AbsenceMessage {
    let guardian = student.parent_name.as_deref().unwrap_or("Guardian");
    AbsenceMessage {
        to,
        subject: format!("Absence notice for {} on {}", student.display_name(), date),
        body: format!(
            "Dear {guardian},\n\n{name} was marked absent on {date}. \
             If this absence is unexpected, please contact the school office.\n\n\
             School Administration",
            name = student.display_name(),
        ),
    }
}

/// Fans out one guardian notification per student marked Absent on a date.
/// Partial success is the expected outcome: individual send failures are
/// logged and counted, never propagated.
pub struct AbsenceNotifier {
    store: Arc<dyn RecordStore>,
    roster: Arc<dyn Roster>,
    mailer: Arc<dyn Mailer>,
}

impl AbsenceNotifier {
    pub fn new(
        store: Arc<dyn RecordStore>,
        roster: Arc<dyn Roster>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            store,
            roster,
            mailer,
        }
    }

    pub async fn notify_absences(&self, date: &str) -> Result<NotifyOutcome, AttendanceError> {
        if date.trim().is_empty() {
            return Err(AttendanceError::validation("missing required fields"));
        }

        let day = normalize_date(date)?;
        let (start, end) = day_bounds(day);

        let days = self.store.find_range(start, end, None).await?;

        let absent_codes: Vec<String> = days
            .iter()
            .flat_map(|d| d.entries.iter())
            .filter(|e| e.status == AttendanceStatus::Absent)
            .map(|e| e.student_code.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        if absent_codes.is_empty() {
            info!(date = %day, "No absences to notify");
            return Ok(NotifyOutcome {
                attempted: 0,
                failed: 0,
            });
        }

        // One batched roster call for the whole set of absent students.
        let students = self.roster.find_by_codes(&absent_codes).await?;
        let by_code: HashMap<&str, &Student> = students
            .iter()
            .map(|s| (s.student_code.as_str(), s))
            .collect();

        let mut messages = Vec::with_capacity(absent_codes.len());
        for code in &absent_codes {
            let Some(student) = by_code.get(code.as_str()).copied() else {
                warn!(student_code = %code, date = %day, "Skipping absence notice for unknown student");
                continue;
            };

            match student.parent_email.as_deref() {
                Some(email) if !email.trim().is_empty() => {
                    messages.push(absence_message(student, email.to_owned(), day));
                }
                _ => {
                    warn!(
                        student_code = %code,
                        date = %day,
                        "Skipping absence notice: no guardian email on file"
                    );
                }
            }
        }

        let attempted = messages.len();

        let sends = messages.into_iter().map(|message| {
            let mailer = Arc::clone(&self.mailer);
            async move {
                mailer
                    .send(&message.to, &message.subject, &message.body)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, to = %message.to, "Failed to send absence notice");
                    })
            }
        });

        let results = join_all(sends).await;
        let failed = results.iter().filter(|r| r.is_err()).count();

        info!(date = %day, attempted, failed, "Absence notification batch complete");

        Ok(NotifyOutcome { attempted, failed })
    }
}
