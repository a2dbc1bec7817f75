use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::{StudentAnswer, StudentTestResult};

pub(crate) const RESULT_COLUMNS: &str = "id, student_id, test_launch_id, score, completed_at";

pub(crate) struct CreateStudentAnswer<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) test_launch_id: &'a str,
    pub(crate) question_id: &'a str,
    pub(crate) selected_answer_ids: &'a [String],
    pub(crate) is_checked: bool,
    pub(crate) is_correct: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) struct CreateResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) student_id: &'a str,
    pub(crate) test_launch_id: &'a str,
    pub(crate) score: f64,
    pub(crate) completed_at: PrimitiveDateTime,
}

/// One scored row of a launch leaderboard.
#[derive(Debug, FromRow)]
pub(crate) struct LaunchResultRow {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) score: f64,
    pub(crate) completed_at: PrimitiveDateTime,
}

pub(crate) async fn insert_answer<'e>(
    executor: impl PgExecutor<'e>,
    params: CreateStudentAnswer<'_>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO student_answers
             (id, student_id, test_launch_id, question_id, selected_answer_ids,
              is_checked, is_correct, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
    )
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.test_launch_id)
    .bind(params.question_id)
    .bind(Json(params.selected_answer_ids))
    .bind(params.is_checked)
    .bind(params.is_correct)
    .bind(params.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn insert_result<'e>(
    executor: impl PgExecutor<'e>,
    params: CreateResult<'_>,
) -> Result<StudentTestResult, sqlx::Error> {
    sqlx::query_as::<_, StudentTestResult>(&format!(
        "INSERT INTO student_test_results (id, student_id, test_launch_id, score, completed_at)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {RESULT_COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.student_id)
    .bind(params.test_launch_id)
    .bind(params.score)
    .bind(params.completed_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_result(
    pool: &PgPool,
    student_id: &str,
    launch_id: &str,
) -> Result<Option<StudentTestResult>, sqlx::Error> {
    sqlx::query_as::<_, StudentTestResult>(&format!(
        "SELECT {RESULT_COLUMNS} FROM student_test_results
         WHERE student_id = $1 AND test_launch_id = $2"
    ))
    .bind(student_id)
    .bind(launch_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn list_for_launch(
    pool: &PgPool,
    launch_id: &str,
) -> Result<Vec<LaunchResultRow>, sqlx::Error> {
    sqlx::query_as::<_, LaunchResultRow>(
        "SELECT r.id, r.student_id, s.name AS student_name, r.score, r.completed_at
         FROM student_test_results r
         JOIN students s ON s.id = r.student_id
         WHERE r.test_launch_id = $1
         ORDER BY r.score DESC, r.completed_at",
    )
    .bind(launch_id)
    .fetch_all(pool)
    .await
}

pub(crate) async fn answers_for_student(
    pool: &PgPool,
    student_id: &str,
    launch_id: &str,
) -> Result<Vec<StudentAnswer>, sqlx::Error> {
    sqlx::query_as::<_, StudentAnswer>(
        "SELECT sa.id, sa.student_id, sa.test_launch_id, sa.question_id,
                sa.selected_answer_ids, sa.is_checked, sa.is_correct, sa.created_at
         FROM student_answers sa
         JOIN questions q ON q.id = sa.question_id
         WHERE sa.student_id = $1 AND sa.test_launch_id = $2
         ORDER BY q.order_index, q.id",
    )
    .bind(student_id)
    .bind(launch_id)
    .fetch_all(pool)
    .await
}
