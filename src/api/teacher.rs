use crate::{
    auth::auth::AuthUser,
    model::teacher::Teacher,
    utils::db_utils::{build_update_sql, execute_update},
};
use actix_web::{HttpResponse, Responder, error::ErrorInternalServerError, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateTeacher {
    #[schema(example = "Anika")]
    pub first_name: String,
    #[schema(example = "Chowdhury")]
    pub last_name: String,
    #[schema(example = "anika.chowdhury@school.edu")]
    pub email: String,
    #[schema(example = "Mathematics", nullable = true)]
    pub subject: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct TeacherQuery {
    /// Pagination page number (start with 1)
    pub page: Option<u32>,
    /// Items per page
    pub per_page: Option<u32>,
}

#[derive(Serialize, ToSchema)]
pub struct TeacherListResponse {
    pub data: Vec<Teacher>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 20)]
    pub per_page: u32,
    #[schema(example = 12)]
    pub total: i64,
}

/// Create Teacher
#[utoipa::path(
    post,
    path = "/api/v1/teachers",
    request_body = CreateTeacher,
    responses(
        (status = 201, description = "Teacher created"),
        (status = 409, description = "Email already exists"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateTeacher>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    if payload.first_name.trim().is_empty() || payload.email.trim().is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": "first_name and email are required"
        })));
    }

    let result = sqlx::query(
        "INSERT INTO teachers (first_name, last_name, email, subject) VALUES (?, ?, ?, ?)",
    )
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.email)
    .bind(&payload.subject)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Teacher created"
        }))),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Ok(HttpResponse::Conflict().json(json!({
                        "message": "Email already exists"
                    })));
                }
            }

            error!(error = %e, "Failed to create teacher");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}

/// List teachers (paginated)
#[utoipa::path(
    get,
    path = "/api/v1/teachers",
    params(TeacherQuery),
    responses(
        (status = 200, description = "Paginated teacher list", body = TeacherListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_teachers(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<TeacherQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(20).clamp(1, 100);
    let offset = (page - 1) * per_page;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM teachers")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to count teachers");
            ErrorInternalServerError("Database error")
        })?;

    let teachers = sqlx::query_as::<_, Teacher>(
        "SELECT id, first_name, last_name, email, subject FROM teachers \
         ORDER BY last_name, first_name LIMIT ? OFFSET ?",
    )
    .bind(per_page as i64)
    .bind(offset as i64)
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, "Failed to fetch teachers");
        ErrorInternalServerError("Database error")
    })?;

    Ok(HttpResponse::Ok().json(TeacherListResponse {
        data: teachers,
        page,
        per_page,
        total,
    }))
}

/// Get Teacher by ID
#[utoipa::path(
    get,
    path = "/api/v1/teachers/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Teacher found", body = Teacher),
        (status = 404, description = "Teacher not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let teacher_id = path.into_inner();

    let teacher = sqlx::query_as::<_, Teacher>(
        "SELECT id, first_name, last_name, email, subject FROM teachers WHERE id = ?",
    )
    .bind(teacher_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(|e| {
        error!(error = %e, teacher_id, "Failed to fetch teacher");
        ErrorInternalServerError("Internal Server Error")
    })?;

    match teacher {
        Some(t) => Ok(HttpResponse::Ok().json(t)),
        None => Ok(HttpResponse::NotFound().json(json!({
            "message": "Teacher not found"
        }))),
    }
}

/// Update Teacher (partial)
#[utoipa::path(
    put,
    path = "/api/v1/teachers/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    request_body = Object,
    responses(
        (status = 200, description = "Teacher updated"),
        (status = 404, description = "Teacher not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();

    let update = build_update_sql("teachers", &body, "id", teacher_id)?;

    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(actix_web::error::ErrorInternalServerError)?;

    if affected == 0 {
        return Ok(HttpResponse::NotFound().body("Teacher not found"));
    }

    Ok(HttpResponse::Ok().body("Teacher updated successfully"))
}

/// Delete Teacher
#[utoipa::path(
    delete,
    path = "/api/v1/teachers/{teacher_id}",
    params(
        ("teacher_id", Path, description = "Teacher ID")
    ),
    responses(
        (status = 200, description = "Successfully deleted"),
        (status = 404, description = "Teacher not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    tag = "Teacher",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_teacher(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<i64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let teacher_id = path.into_inner();

    let result = sqlx::query("DELETE FROM teachers WHERE id = ?")
        .bind(teacher_id)
        .execute(pool.get_ref())
        .await;

    match result {
        Ok(res) => {
            if res.rows_affected() == 0 {
                return Ok(HttpResponse::NotFound().json(json!({
                    "message": "Teacher not found"
                })));
            }

            Ok(HttpResponse::Ok().json(json!({
                "message": "Successfully deleted"
            })))
        }
        Err(e) => {
            error!(error = %e, teacher_id, "Failed to delete teacher");
            Ok(HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            })))
        }
    }
}
