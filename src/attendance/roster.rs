use async_trait::async_trait;
use sqlx::MySqlPool;

use super::error::AttendanceError;
use crate::model::student::Student;

/// Read-only directory lookups. The attendance core never creates or mutates
/// roster entities through this seam.
#[async_trait]
pub trait Roster: Send + Sync {
    /// Batched lookup by student code. Unknown codes are simply absent from
    /// the result, never an error.
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Student>, AttendanceError>;

    async fn teacher_exists(&self, teacher_id: u64) -> Result<bool, AttendanceError>;
}

pub struct SqlRoster {
    pool: MySqlPool,
}

impl SqlRoster {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Roster for SqlRoster {
    async fn find_by_codes(&self, codes: &[String]) -> Result<Vec<Student>, AttendanceError> {
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; codes.len()].join(", ");
        let sql = format!(
            "SELECT id, student_code, first_name, last_name, grade, parent_name, parent_email, parent_phone \
             FROM students WHERE student_code IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, Student>(&sql);
        for code in codes {
            query = query.bind(code);
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    async fn teacher_exists(&self, teacher_id: u64) -> Result<bool, AttendanceError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM teachers WHERE id = ? LIMIT 1)")
                .bind(teacher_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }
}
