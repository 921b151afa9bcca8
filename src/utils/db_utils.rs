use actix_web::error::ErrorBadRequest;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;
use sqlx::MySqlPool;

/// SQL bindable value
#[derive(Debug)]
pub enum SqlValue {
    String(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Null,
}

impl SqlValue {
    /// Map a JSON value to a typed bind. Strings that parse as dates or
    /// datetimes bind as such, so DATE/DATETIME columns accept them.
    fn from_json(value: &Value) -> Result<Self, actix_web::Error> {
        match value {
            Value::String(s) => {
                if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
                    Ok(SqlValue::Date(d))
                } else if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
                    Ok(SqlValue::DateTime(dt))
                } else {
                    Ok(SqlValue::String(s.clone()))
                }
            }
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Ok(SqlValue::I64(i))
                } else if let Some(f) = n.as_f64() {
                    Ok(SqlValue::F64(f))
                } else {
                    Err(ErrorBadRequest("Unsupported numeric value"))
                }
            }
            Value::Bool(b) => Ok(SqlValue::Bool(*b)),
            Value::Null => Ok(SqlValue::Null),
            _ => Err(ErrorBadRequest("Unsupported JSON value type")),
        }
    }
}

/// Dynamic UPDATE statement plus its binds, built from a JSON payload.
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

/// Build `UPDATE <table> SET k1 = ?, k2 = ? WHERE <id_column> = ?` from the
/// fields present in `payload`. Empty payloads are rejected.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    id_column: &str,
    id_value: i64,
) -> Result<SqlUpdate, actix_web::Error> {
    let obj = payload
        .as_object()
        .ok_or_else(|| ErrorBadRequest("Payload must be a JSON object"))?;

    if obj.is_empty() {
        return Err(ErrorBadRequest("No fields provided for update"));
    }

    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for value in obj.values() {
        values.push(SqlValue::from_json(value)?);
    }
    values.push(SqlValue::I64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// Execute the update, returning affected row count.
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::I64(v) => query.bind(v),
            SqlValue::F64(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Date(v) => query.bind(v),
            SqlValue::DateTime(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builds_set_clause_from_payload_fields() {
        let update = build_update_sql(
            "students",
            &json!({"first_name": "Mina", "grade": "5B"}),
            "id",
            42,
        )
        .unwrap();

        assert!(update.sql.starts_with("UPDATE students SET "));
        assert!(update.sql.contains("first_name = ?"));
        assert!(update.sql.contains("grade = ?"));
        assert!(update.sql.ends_with("WHERE id = ?"));
        // two fields plus the trailing id bind
        assert_eq!(update.values.len(), 3);
    }

    #[test]
    fn date_strings_bind_as_dates() {
        let update =
            build_update_sql("teachers", &json!({"hired_on": "2024-03-01"}), "id", 1).unwrap();
        assert!(matches!(update.values[0], SqlValue::Date(_)));
    }

    #[test]
    fn rejects_empty_and_non_object_payloads() {
        assert!(build_update_sql("students", &json!({}), "id", 1).is_err());
        assert!(build_update_sql("students", &json!([1, 2]), "id", 1).is_err());
    }
}
