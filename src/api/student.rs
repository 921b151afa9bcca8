use crate::{
    auth::auth::AuthUser,
    model::student::Student,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::{debug, error};
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, Serialize, ToSchema)]
pub struct CreateStudent {
    #[schema(example = "STU-0001")]
    pub student_code: String,
    #[schema(example = "Mina")]
    pub first_name: String,
    #[schema(example = "Rahman")]
    pub last_name: String,
    #[schema(example = "5A")]
    pub grade: String,
    #[schema(example = "Farid Rahman", nullable = true)]
    pub parent_name: Option<String>,
    #[schema(example = "farid.rahman@example.com", nullable = true)]
    pub parent_email: Option<String>,
    #[schema(example = "+8801712345678", nullable = true)]
    pub parent_phone: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct StudentQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
    /// Filter by grade
    pub grade: Option<String>,
    /// Search by name or student code
    pub search: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct StudentListResponse {
    pub data: Vec<Student>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 57)]
    pub total: i64,
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    Str(&'a str),
    Like(String),
}

/// Create Student
#[utoipa::path(
    post,
    path = "/api/v1/students",
    request_body = CreateStudent,
    responses(
        (status = 201, description = "Student created", body = Object, example = json!({
            "message": "Student created"
        })),
        (status = 409, description = "Student code already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateStudent>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    if payload.student_code.trim().is_empty()
        || payload.first_name.trim().is_empty()
        || payload.grade.trim().is_empty()
    {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "student_code, first_name and grade are required"
        })));
    }

    let result = sqlx::query(
        r#"
        INSERT INTO students
        (student_code, first_name, last_name, grade, parent_name, parent_email, parent_phone)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&payload.student_code)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.grade)
    .bind(&payload.parent_name)
    .bind(&payload.parent_email)
    .bind(&payload.parent_phone)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Student created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Student code already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to create student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List students (paginated, filterable)
#[utoipa::path(
    get,
    path = "/api/v1/students",
    params(StudentQuery),
    responses(
        (status = 200, description = "Paginated student list", body = StudentListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_students(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<StudentQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    // ---------- build WHERE clause dynamically ----------
    let mut conditions = Vec::new();
    let mut args: Vec<FilterValue> = Vec::new();

    if let Some(grade) = query.grade.as_deref() {
        conditions.push("grade = ?");
        args.push(FilterValue::Str(grade));
    }

    if let Some(search) = query.search.as_deref() {
        conditions.push("(first_name LIKE ? OR last_name LIKE ? OR student_code LIKE ?)");
        let like = format!("%{}%", search);
        args.push(FilterValue::Like(like.clone()));
        args.push(FilterValue::Like(like.clone()));
        args.push(FilterValue::Like(like));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    // ---------- total count ----------
    let count_sql = format!("SELECT COUNT(*) FROM students {}", where_clause);
    debug!(sql = %count_sql, "Counting students");

    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for arg in &args {
        count_query = match arg {
            FilterValue::Str(s) => count_query.bind(*s),
            FilterValue::Like(s) => count_query.bind(s.clone()),
        };
    }

    let total = count_query.fetch_one(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, "Failed to count students");
        ErrorInternalServerError("Database error")
    })?;

    // ---------- data query ----------
    let data_sql = format!(
        "SELECT id, student_code, first_name, last_name, grade, parent_name, parent_email, parent_phone \
         FROM students {} ORDER BY grade, last_name, first_name LIMIT ? OFFSET ?",
        where_clause
    );

    let mut data_query = sqlx::query_as::<_, Student>(&data_sql);
    for arg in args {
        data_query = match arg {
            FilterValue::Str(s) => data_query.bind(s),
            FilterValue::Like(s) => data_query.bind(s),
        };
    }

    let students = data_query
        .bind(per_page as i64)
        .bind(offset as i64)
        .fetch_all(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch students");
            ErrorInternalServerError("Database error")
        })?;

    Ok(HttpResponse::Ok().json(StudentListResponse {
        data: students,
        page,
        per_page,
        total,
    }))
}

/// Get Student by ID
#[utoipa::path(
    get,
    path = "/api/v1/students/{student_id}",
    params(
        ("student_id", Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Student found", body = Student),
        (status = 404, description = "Student not found", body = Object, example = json!({
            "message": "Student not found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let student_id = path.into_inner();

    let student = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, student_code, first_name, last_name, grade,
               parent_name, parent_email, parent_phone
        FROM students
        WHERE id = ?
        "#,
    )
    .bind(student_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, student_id, "Failed to fetch student");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match student {
        Some(s) => Ok(HttpResponse::Ok().json(s)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Student not found"
        }))),
    }
}

/// Update Student (partial)
#[utoipa::path(
    put,
    path = "/api/v1/students/{student_id}",
    params(
        ("student_id", Path, description = "Student ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Student updated"),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let student_id = path.into_inner();

    let update = build_update_sql("students", &body, "id", student_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Student not found"));
    }

    Ok(HttpResponse::Ok().body("Student updated successfully"))
}

/// Delete Student
#[utoipa::path(
    delete,
    path = "/api/v1/students/{student_id}",
    params(
        ("student_id", Path, description = "Student ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Student not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Student",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_student(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let student_id = path.into_inner();

    let result = sqlx::query("DELETE FROM students WHERE id = ?")
        .bind(student_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Student not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, student_id, "Failed to delete student");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
