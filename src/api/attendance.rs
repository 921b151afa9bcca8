use crate::attendance::{AbsenceNotifier, Reconciler};
use crate::auth::auth::AuthUser;
use crate::model::attendance::AttendanceEntry;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct RecordAttendanceRequest {
    #[schema(example = "2024-03-01")]
    pub date: String,
    #[schema(example = "5A")]
    pub grade: String,
    pub entries: Vec<AttendanceEntry>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    #[schema(example = "2024-03-01")]
    pub date: String,
    /// Optional grade filter
    #[schema(example = "5A")]
    pub grade: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ClearAttendanceQuery {
    #[schema(example = "2024-03-01")]
    pub date: String,
}

#[derive(Deserialize, ToSchema)]
pub struct NotifyAbsencesRequest {
    #[schema(example = "2024-03-01")]
    pub date: String,
}

/// Record a batch of attendance for one grade and date
#[utoipa::path(
    post,
    path = "/api/v1/attendance",
    request_body = RecordAttendanceRequest,
    responses(
        (status = 200, description = "Batch committed", body = Object, example = json!({
            "status": "created",
            "record": {
                "id": 1,
                "date": "2024-03-01",
                "grade": "5A",
                "recorded_by": 7,
                "entries": [
                    { "student_code": "STU-0001", "status": "Present" },
                    { "student_code": "STU-0002", "status": "Absent" }
                ]
            }
        })),
        (status = 400, description = "Missing or malformed fields"),
        (status = 404, description = "Teacher not found"),
        (status = 409, description = "Duplicate student in batch, or already recorded for this date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "No teacher profile"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn record_attendance(
    auth: AuthUser,
    reconciler: web::Data<Reconciler>,
    payload: web::Json<RecordAttendanceRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let recorded_by: u64 = auth
        .teacher_id
        .ok_or_else(|| actix_web::error::ErrorForbidden("No teacher profile"))?;

    let outcome = reconciler
        .record_attendance(&payload.date, &payload.grade, &payload.entries, recorded_by)
        .await?;

    Ok(HttpResponse::Ok().json(outcome))
}

/// Query attendance for a date, optionally filtered by grade
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Matching attendance days with resolved student names"),
        (status = 400, description = "Missing or malformed date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn query_attendance(
    auth: AuthUser,
    reconciler: web::Data<Reconciler>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let days = reconciler
        .query_attendance(&query.date, query.grade.as_deref())
        .await?;

    Ok(HttpResponse::Ok().json(days))
}

/// Clear all attendance recorded on a date
#[utoipa::path(
    delete,
    path = "/api/v1/attendance",
    params(ClearAttendanceQuery),
    responses(
        (status = 200, description = "Deleted count (zero when nothing matched)", body = Object, example = json!({
            "deleted_count": 2
        })),
        (status = 400, description = "Missing or malformed date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin only"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn clear_attendance(
    auth: AuthUser,
    reconciler: web::Data<Reconciler>,
    query: web::Query<ClearAttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let deleted = reconciler.clear_attendance(&query.date).await?;

    Ok(HttpResponse::Ok().json(json!({
        "deleted_count": deleted
    })))
}

/// Send absence notices to guardians for a date
#[utoipa::path(
    post,
    path = "/api/v1/attendance/notify",
    request_body = NotifyAbsencesRequest,
    responses(
        (status = 200, description = "Dispatch counts; partial failure is a success", body = Object, example = json!({
            "attempted": 3,
            "failed": 1
        })),
        (status = 400, description = "Missing or malformed date"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn notify_absences(
    auth: AuthUser,
    notifier: web::Data<AbsenceNotifier>,
    payload: web::Json<NotifyAbsencesRequest>,
) -> actix_web::Result<impl Responder> {
    auth.require_teacher_or_admin()?;

    let outcome = notifier.notify_absences(&payload.date).await?;

    Ok(HttpResponse::Ok().json(outcome))
}
