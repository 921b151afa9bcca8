use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{MySqlConnection, MySqlPool};

use super::error::AttendanceError;
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus, NewAttendanceDay};

/// Persistence seam for attendance days.
///
/// Contract: `append_entries` is all-or-nothing. If any submitted student is
/// already present on the day, it fails with `Conflict` and writes nothing.
/// Range operations take half-open `[start, end)` bounds.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn find_day(
        &self,
        date: NaiveDate,
        grade: &str,
    ) -> Result<Option<AttendanceDay>, AttendanceError>;

    async fn insert_day(&self, day: NewAttendanceDay) -> Result<AttendanceDay, AttendanceError>;

    async fn append_entries(
        &self,
        date: NaiveDate,
        grade: &str,
        entries: &[AttendanceEntry],
    ) -> Result<AttendanceDay, AttendanceError>;

    async fn find_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        grade: Option<&str>,
    ) -> Result<Vec<AttendanceDay>, AttendanceError>;

    async fn delete_range(&self, start: NaiveDate, end: NaiveDate)
    -> Result<u64, AttendanceError>;
}

/// MySQL-backed store. Days and entries live in two tables joined in
/// application code; entry uniqueness per day is backed by a UNIQUE key.
pub struct SqlRecordStore {
    pool: MySqlPool,
}

impl SqlRecordStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct DayRow {
    id: u64,
    date: NaiveDate,
    grade: String,
    recorded_by: u64,
}

#[derive(sqlx::FromRow)]
struct EntryRow {
    day_id: u64,
    student_code: String,
    status: String,
}

fn is_duplicate_key(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        db_err.code().as_deref() == Some("23000")
    } else {
        false
    }
}

fn parse_status(raw: &str) -> Result<AttendanceStatus, AttendanceError> {
    AttendanceStatus::from_str(raw)
        .map_err(|_| AttendanceError::Storage(format!("invalid status in store: {raw}")))
}

fn entries_from_rows(rows: Vec<EntryRow>) -> Result<Vec<AttendanceEntry>, AttendanceError> {
    rows.into_iter()
        .map(|row| {
            Ok(AttendanceEntry {
                student_code: row.student_code,
                status: parse_status(&row.status)?,
            })
        })
        .collect()
}

/// Load one day with its entries over a single connection (used inside the
/// append transaction so the result reflects uncommitted writes).
async fn load_day(
    conn: &mut MySqlConnection,
    day_id: u64,
) -> Result<AttendanceDay, AttendanceError> {
    let day: DayRow = sqlx::query_as(
        "SELECT id, date, grade, recorded_by FROM attendance_days WHERE id = ?",
    )
    .bind(day_id)
    .fetch_one(&mut *conn)
    .await?;

    let rows: Vec<EntryRow> = sqlx::query_as(
        "SELECT day_id, student_code, status FROM attendance_entries WHERE day_id = ? ORDER BY id",
    )
    .bind(day_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(AttendanceDay {
        id: day.id,
        date: day.date,
        grade: day.grade,
        recorded_by: day.recorded_by,
        entries: entries_from_rows(rows)?,
    })
}

#[async_trait]
impl RecordStore for SqlRecordStore {
    async fn find_day(
        &self,
        date: NaiveDate,
        grade: &str,
    ) -> Result<Option<AttendanceDay>, AttendanceError> {
        let day: Option<DayRow> = sqlx::query_as(
            "SELECT id, date, grade, recorded_by FROM attendance_days WHERE date = ? AND grade = ?",
        )
        .bind(date)
        .bind(grade)
        .fetch_optional(&self.pool)
        .await?;

        let Some(day) = day else {
            return Ok(None);
        };

        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT day_id, student_code, status FROM attendance_entries WHERE day_id = ? ORDER BY id",
        )
        .bind(day.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(AttendanceDay {
            id: day.id,
            date: day.date,
            grade: day.grade,
            recorded_by: day.recorded_by,
            entries: entries_from_rows(rows)?,
        }))
    }

    async fn insert_day(&self, day: NewAttendanceDay) -> Result<AttendanceDay, AttendanceError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO attendance_days (date, grade, recorded_by) VALUES (?, ?, ?)",
        )
        .bind(day.date)
        .bind(&day.grade)
        .bind(day.recorded_by)
        .execute(&mut *tx)
        .await;

        // A racing creator for the same (date, grade) trips the UNIQUE key;
        // the loser must observe a conflict, not a second day.
        let day_id = match result {
            Ok(res) => res.last_insert_id(),
            Err(e) if is_duplicate_key(&e) => {
                return Err(AttendanceError::conflict(
                    "attendance already recorded for this grade and date",
                ));
            }
            Err(e) => return Err(e.into()),
        };

        for entry in &day.entries {
            sqlx::query(
                "INSERT INTO attendance_entries (day_id, student_code, status) VALUES (?, ?, ?)",
            )
            .bind(day_id)
            .bind(&entry.student_code)
            .bind(entry.status.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(AttendanceDay {
            id: day_id,
            date: day.date,
            grade: day.grade,
            recorded_by: day.recorded_by,
            entries: day.entries,
        })
    }

    async fn append_entries(
        &self,
        date: NaiveDate,
        grade: &str,
        entries: &[AttendanceEntry],
    ) -> Result<AttendanceDay, AttendanceError> {
        let mut tx = self.pool.begin().await?;

        // Lock the day row so concurrent appends for the same (date, grade)
        // serialize here instead of interleaving their entry inserts.
        let row: Option<(u64,)> = sqlx::query_as(
            "SELECT id FROM attendance_days WHERE date = ? AND grade = ? FOR UPDATE",
        )
        .bind(date)
        .bind(grade)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((day_id,)) = row else {
            return Err(AttendanceError::not_found("attendance day not found"));
        };

        for entry in entries {
            let result = sqlx::query(
                "INSERT INTO attendance_entries (day_id, student_code, status) VALUES (?, ?, ?)",
            )
            .bind(day_id)
            .bind(&entry.student_code)
            .bind(entry.status.to_string())
            .execute(&mut *tx)
            .await;

            // Dropping the transaction rolls back every entry of this batch.
            if let Err(e) = result {
                if is_duplicate_key(&e) {
                    return Err(AttendanceError::conflict(
                        "attendance already recorded for one or more students on this date",
                    ));
                }
                return Err(e.into());
            }
        }

        let day = load_day(&mut *tx, day_id).await?;
        tx.commit().await?;

        Ok(day)
    }

    async fn find_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        grade: Option<&str>,
    ) -> Result<Vec<AttendanceDay>, AttendanceError> {
        let mut sql = String::from(
            "SELECT id, date, grade, recorded_by FROM attendance_days WHERE date >= ? AND date < ?",
        );
        if grade.is_some() {
            sql.push_str(" AND grade = ?");
        }
        sql.push_str(" ORDER BY date, grade");

        let mut query = sqlx::query_as::<_, DayRow>(&sql).bind(start).bind(end);
        if let Some(grade) = grade {
            query = query.bind(grade);
        }

        let days = query.fetch_all(&self.pool).await?;
        if days.is_empty() {
            return Ok(Vec::new());
        }

        // Second step of the explicit two-step read: pull every entry for the
        // matched days in one query and merge by day id.
        let placeholders = vec!["?"; days.len()].join(", ");
        let entry_sql = format!(
            "SELECT day_id, student_code, status FROM attendance_entries WHERE day_id IN ({placeholders}) ORDER BY id"
        );

        let mut entry_query = sqlx::query_as::<_, EntryRow>(&entry_sql);
        for day in &days {
            entry_query = entry_query.bind(day.id);
        }

        let mut by_day: HashMap<u64, Vec<AttendanceEntry>> = HashMap::new();
        for row in entry_query.fetch_all(&self.pool).await? {
            let day_id = row.day_id;
            let entry = AttendanceEntry {
                student_code: row.student_code,
                status: parse_status(&row.status)?,
            };
            by_day.entry(day_id).or_default().push(entry);
        }

        Ok(days
            .into_iter()
            .map(|day| AttendanceDay {
                entries: by_day.remove(&day.id).unwrap_or_default(),
                id: day.id,
                date: day.date,
                grade: day.grade,
                recorded_by: day.recorded_by,
            })
            .collect())
    }

    async fn delete_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, AttendanceError> {
        // Entries go with their day via ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM attendance_days WHERE date >= ? AND date < ?")
            .bind(start)
            .bind(end)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
