use sqlx::{PgExecutor, PgPool};
use time::PrimitiveDateTime;

use crate::db::models::Student;

pub(crate) const COLUMNS: &str =
    "id, classroom_id, name, student_code, created_at, updated_at";

pub(crate) struct CreateStudent<'a> {
    pub(crate) id: &'a str,
    pub(crate) classroom_id: &'a str,
    pub(crate) name: &'a str,
    pub(crate) student_code: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

pub(crate) async fn create<'e>(
    executor: impl PgExecutor<'e>,
    params: CreateStudent<'_>,
) -> Result<Student, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "INSERT INTO students (id, classroom_id, name, student_code, created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(params.classroom_id)
    .bind(params.name)
    .bind(params.student_code)
    .bind(params.created_at)
    .bind(params.updated_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!("SELECT {COLUMNS} FROM students WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_by_code(
    pool: &PgPool,
    student_code: &str,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "SELECT {COLUMNS} FROM students WHERE student_code = $1"
    ))
    .bind(student_code)
    .fetch_optional(pool)
    .await
}

/// Students across all of the owner's classrooms, optionally narrowed to one.
pub(crate) async fn list_by_owner(
    pool: &PgPool,
    owner_id: &str,
    classroom_id: Option<&str>,
) -> Result<Vec<Student>, sqlx::Error> {
    let mut builder = sqlx::QueryBuilder::new(
        "SELECT s.id, s.classroom_id, s.name, s.student_code, s.created_at, s.updated_at
         FROM students s
         JOIN classrooms c ON c.id = s.classroom_id
         WHERE c.owner_id = ",
    );
    builder.push_bind(owner_id);
    if let Some(classroom_id) = classroom_id {
        builder.push(" AND s.classroom_id = ");
        builder.push_bind(classroom_id);
    }
    builder.push(" ORDER BY s.created_at");
    builder.build_query_as::<Student>().fetch_all(pool).await
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    name: &str,
    classroom_id: &str,
    now: PrimitiveDateTime,
) -> Result<Option<Student>, sqlx::Error> {
    sqlx::query_as::<_, Student>(&format!(
        "UPDATE students SET name = $1, classroom_id = $2, updated_at = $3
         WHERE id = $4
         RETURNING {COLUMNS}"
    ))
    .bind(name)
    .bind(classroom_id)
    .bind(now)
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM students WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected())
}
