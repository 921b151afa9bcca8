use crate::api::attendance::{
    AttendanceQuery, ClearAttendanceQuery, NotifyAbsencesRequest, RecordAttendanceRequest,
};
use crate::api::student::{CreateStudent, StudentListResponse, StudentQuery};
use crate::api::teacher::{CreateTeacher, TeacherListResponse, TeacherQuery};
use crate::attendance::notifier::NotifyOutcome;
use crate::attendance::reconciler::{
    AttendanceDayView, AttendanceEntryView, RecordOutcome, RecordStatus,
};
use crate::model::attendance::{AttendanceDay, AttendanceEntry, AttendanceStatus};
use crate::model::student::Student;
use crate::model::teacher::Teacher;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "School Attendance API",
        version = "1.0.0",
        description = r#"
## School Attendance Management System

This API powers a school attendance tracker for teachers and administrators.

### Key Features
- **Student Management**
  - Create, update, list, and view student profiles with guardian contacts
- **Teacher Management**
  - Manage the teacher directory
- **Attendance**
  - Record daily per-grade attendance batches (at most one status per
    student per date), query by date and grade, clear a date wholesale
- **Guardian Alerts**
  - Send absence notices to guardians of absent students

### Security
Most endpoints are protected using **JWT Bearer authentication**.
Recording attendance requires a linked teacher profile; destructive
operations are admin-only.

### Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints
"#,
    ),
    paths(
        crate::api::attendance::record_attendance,
        crate::api::attendance::query_attendance,
        crate::api::attendance::clear_attendance,
        crate::api::attendance::notify_absences,

        crate::api::student::create_student,
        crate::api::student::get_student,
        crate::api::student::list_students,
        crate::api::student::update_student,
        crate::api::student::delete_student,

        crate::api::teacher::create_teacher,
        crate::api::teacher::get_teacher,
        crate::api::teacher::list_teachers,
        crate::api::teacher::update_teacher,
        crate::api::teacher::delete_teacher
    ),
    components(
        schemas(
            AttendanceStatus,
            AttendanceEntry,
            AttendanceDay,
            AttendanceDayView,
            AttendanceEntryView,
            RecordStatus,
            RecordOutcome,
            NotifyOutcome,
            RecordAttendanceRequest,
            AttendanceQuery,
            ClearAttendanceQuery,
            NotifyAbsencesRequest,
            Student,
            CreateStudent,
            StudentQuery,
            StudentListResponse,
            Teacher,
            CreateTeacher,
            TeacherQuery,
            TeacherListResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Attendance recording and guardian alerts"),
        (name = "Student", description = "Student roster APIs"),
        (name = "Teacher", description = "Teacher directory APIs"),
    )
)]
pub struct ApiDoc;
