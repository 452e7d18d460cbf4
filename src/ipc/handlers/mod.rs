pub mod auth;
pub mod classes;
pub mod complaints;
pub mod core;
pub mod notifications;
pub mod records;
pub mod reports;
pub mod setup;
pub mod students;

use crate::error::{AppError, AppResult};
use crate::model::{HealthRecord, Identity};
use crate::store::Store;

/// Directory id behind a student session. Fails once the student has been
/// removed from the directory, even though the login still works.
pub(crate) fn own_student_id(store: &Store, who: &Identity) -> AppResult<String> {
    store
        .directory_id(who)
        .map(str::to_string)
        .ok_or_else(|| AppError::not_found("student", who.username()))
}

/// Records visible to a session: a student's own, a teacher's class, or all.
pub(crate) fn scoped_records<'a>(store: &'a Store, who: &Identity) -> Vec<&'a HealthRecord> {
    match who {
        Identity::Student { .. } => store
            .directory_id(who)
            .map(|id| store.records_by_student(id))
            .unwrap_or_default(),
        Identity::Teacher { class_label, .. } => store.records_by_class(class_label),
        Identity::Admin { .. } => store.all_records(),
    }
}
