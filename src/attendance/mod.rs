//! Attendance core: the reconciler that enforces at-most-one-status per
//! student per (date, grade), the absence notifier, and the collaborator
//! seams (record store, roster, mailer) they run against.

pub mod dates;
pub mod error;
pub mod fake;
pub mod mailer;
pub mod notifier;
pub mod reconciler;
pub mod roster;
pub mod store;

pub use error::AttendanceError;
pub use notifier::{AbsenceNotifier, NotifyOutcome};
pub use reconciler::{RecordOutcome, RecordStatus, Reconciler};
