use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::TestLaunch;

pub(crate) const COLUMNS: &str =
    "id, test_id, title, session_id, launched_at, expires_at, is_active, created_at, updated_at";

pub(crate) struct CreateLaunch<'a> {
    pub(crate) id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) session_id: &'a str,
    pub(crate) launched_at: Option<PrimitiveDateTime>,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) struct UpdateLaunch<'a> {
    pub(crate) id: &'a str,
    pub(crate) title: &'a str,
    pub(crate) launched_at: Option<PrimitiveDateTime>,
    pub(crate) expires_at: Option<PrimitiveDateTime>,
    pub(crate) is_active: bool,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create<'e>(
    executor: impl PgExecutor<'e>,
    params: CreateLaunch<'_>,
) -> Result<TestLaunch, sqlx::Error> {
    sqlx::query_as::<_, TestLaunch>(&format!(
        "INSERT INTO test_launches
             (id, test_id, title, session_id, launched_at, expires_at, is_active, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.test_id)
    .bind(params.title)
    .bind(params.session_id)
    .bind(params.launched_at)
    .bind(params.expires_at)
    .bind(params.is_active)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn add_classroom<'e>(
    executor: impl PgExecutor<'e>,
    launch_id: &str,
    classroom_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO test_launch_classrooms (test_launch_id, classroom_id) VALUES ($1, $2)",
    )
    .bind(launch_id)
    .bind(classroom_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub(crate) async fn clear_classrooms<'e>(
    executor: impl PgExecutor<'e>,
    launch_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM test_launch_classrooms WHERE test_launch_id = $1")
        .bind(launch_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<TestLaunch>, sqlx::Error> {
    sqlx::query_as::<_, TestLaunch>(&format!("SELECT {COLUMNS} FROM test_launches WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Launches over the owner's tests, newest first, optionally narrowed to
/// launches admitting one classroom.
pub(crate) async fn list_by_owner(
    pool: &PgPool,
    owner_id: &str,
    classroom_id: Option<&str>,
) -> Result<Vec<TestLaunch>, sqlx::Error> {
    let mut builder = sqlx::QueryBuilder::new(
        "SELECT l.id, l.test_id, l.title, l.session_id, l.launched_at, l.expires_at,
                l.is_active, l.created_at, l.updated_at
         FROM test_launches l
         JOIN tests t ON t.id = l.test_id
         WHERE t.created_by = ",
    );
    builder.push_bind(owner_id);
    if let Some(classroom_id) = classroom_id {
        builder.push(
            " AND EXISTS (
                 SELECT 1 FROM test_launch_classrooms tlc
                 WHERE tlc.test_launch_id = l.id AND tlc.classroom_id = ",
        );
        builder.push_bind(classroom_id);
        builder.push(")");
    }
    builder.push(" ORDER BY l.created_at DESC");
    builder.build_query_as::<TestLaunch>().fetch_all(pool).await
}

pub(crate) async fn classroom_ids(
    pool: &PgPool,
    launch_id: &str,
) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT classroom_id FROM test_launch_classrooms WHERE test_launch_id = $1
         ORDER BY classroom_id",
    )
    .bind(launch_id)
    .fetch_all(pool)
    .await
}

/// Whether the student's classroom is attached to the launch.
pub(crate) async fn is_classroom_admitted(
    pool: &PgPool,
    launch_id: &str,
    classroom_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
             SELECT 1 FROM test_launch_classrooms
             WHERE test_launch_id = $1 AND classroom_id = $2
         )",
    )
    .bind(launch_id)
    .bind(classroom_id)
    .fetch_one(pool)
    .await
}

/// Owner of the test behind the launch, if the launch exists.
pub(crate) async fn owner_of(pool: &PgPool, launch_id: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT t.created_by FROM test_launches l JOIN tests t ON t.id = l.test_id
         WHERE l.id = $1",
    )
    .bind(launch_id)
    .fetch_optional(pool)
    .await
}

/// Flip is_active off for every launch whose deadline has passed.
/// Runs on every read path instead of a background timer.
pub(crate) async fn sweep_expired(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE test_launches SET is_active = FALSE, updated_at = $1
         WHERE is_active = TRUE AND expires_at IS NOT NULL AND expires_at <= $1",
    )
    .bind(now)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn update<'e>(
    executor: impl PgExecutor<'e>,
    params: UpdateLaunch<'_>,
) -> Result<TestLaunch, sqlx::Error> {
    sqlx::query_as::<_, TestLaunch>(&format!(
        "UPDATE test_launches
         SET title = $1, launched_at = $2, expires_at = $3, is_active = $4, updated_at = $5
         WHERE id = $6
         RETURNING {COLUMNS}"
    ))
    .bind(params.title)
    .bind(params.launched_at)
    .bind(params.expires_at)
    .bind(params.is_active)
    .bind(params.updated_at)
    .bind(params.id)
    .fetch_one(executor)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("DELETE FROM test_launches WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
