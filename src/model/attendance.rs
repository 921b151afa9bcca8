use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Per-student status within one attendance day.
///
/// The recording UI also offers "Late", but only these two are accepted
/// server-side; anything else is rejected at deserialization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

/// One student's status inside an [`AttendanceDay`].
///
/// `student_code` is the stable, non-database identifier from the roster
/// (safe to expose to clients). Within one day the codes are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceEntry {
    #[schema(example = "STU-0001")]
    pub student_code: String,
    #[schema(example = "Absent")]
    pub status: AttendanceStatus,
}

/// All attendance taken for one grade on one calendar date.
///
/// Created on the first submission for a (date, grade) pair; later
/// submissions append to `entries`, they never create a second day.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceDay {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "2024-03-01", value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(example = "5A")]
    pub grade: String,
    /// Teacher who created this day's first batch.
    #[schema(example = 7)]
    pub recorded_by: u64,
    pub entries: Vec<AttendanceEntry>,
}

/// Payload for creating a brand-new attendance day.
#[derive(Debug, Clone)]
pub struct NewAttendanceDay {
    pub date: NaiveDate,
    pub grade: String,
    pub recorded_by: u64,
    pub entries: Vec<AttendanceEntry>,
}
