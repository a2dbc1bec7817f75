use sqlx::PgPool;
use thiserror::Error;

use crate::db::models::{Student, TestLaunch};
use crate::repositories::{launches, students};

#[derive(Debug, Error)]
pub(crate) enum AccessError {
    #[error("student not found")]
    StudentNotFound,
    #[error("test launch not found")]
    LaunchNotFound,
    #[error("student's classroom is not part of this launch")]
    NotAdmitted,
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Resolve a student code against a launch: the code must exist, the launch
/// must exist, and the student's classroom must be attached to the launch.
pub(crate) async fn authorize_student(
    pool: &PgPool,
    student_code: &str,
    launch_id: &str,
) -> Result<(Student, TestLaunch), AccessError> {
    let student = students::find_by_code(pool, student_code)
        .await?
        .ok_or(AccessError::StudentNotFound)?;
    let launch =
        launches::find_by_id(pool, launch_id).await?.ok_or(AccessError::LaunchNotFound)?;

    if !launches::is_classroom_admitted(pool, launch_id, &student.classroom_id).await? {
        return Err(AccessError::NotAdmitted);
    }

    Ok((student, launch))
}
