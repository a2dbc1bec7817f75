use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use sqlx::Acquire;
use uuid::Uuid;

use crate::api::classrooms::fetch_owned_classroom;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::{validate_payload, SingleOrBatch};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Student;
use crate::repositories;
use crate::schemas::student::{StudentCreate, StudentListQuery, StudentResponse, StudentUpdate};
use crate::services::codes;

/// Retries before giving up on a free student code. The code space is large
/// enough that more than one retry is already an anomaly.
const CODE_ATTEMPTS: usize = 5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_students).post(create_students))
        .route(
            "/:student_id",
            get(get_student).put(update_student).patch(update_student).delete(delete_student),
        )
}

/// Accepts one student or a list; the response shape mirrors the request.
async fn create_students(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Json(payload): Json<SingleOrBatch<StudentCreate>>,
) -> Result<Response, ApiError> {
    let batch = payload.is_batch();
    let items = payload.into_vec();
    if items.is_empty() {
        return Err(ApiError::BadRequest("At least one student is required".to_string()));
    }

    for item in &items {
        validate_payload(item)?;
        fetch_owned_classroom(&state, &user.id, &item.classroom_id).await?;
    }

    let mut created = Vec::with_capacity(items.len());
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    for item in &items {
        let student = insert_with_fresh_code(&mut tx, &item.classroom_id, &item.name).await?;
        created.push(StudentResponse::from_db(student));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let response = if batch {
        (StatusCode::CREATED, Json(created)).into_response()
    } else {
        let single = created.into_iter().next().ok_or_else(|| {
            ApiError::Internal("Created student went missing".to_string())
        })?;
        (StatusCode::CREATED, Json(single)).into_response()
    };
    Ok(response)
}

async fn list_students(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Query(query): Query<StudentListQuery>,
) -> Result<Json<Vec<StudentResponse>>, ApiError> {
    if let Some(classroom_id) = &query.classroom_id {
        fetch_owned_classroom(&state, &user.id, classroom_id).await?;
    }

    let students =
        repositories::students::list_by_owner(state.db(), &user.id, query.classroom_id.as_deref())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to list students"))?;

    Ok(Json(students.into_iter().map(StudentResponse::from_db).collect()))
}

async fn get_student(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(student_id): Path<String>,
) -> Result<Json<StudentResponse>, ApiError> {
    let student = fetch_owned_student(&state, &user.id, &student_id).await?;
    Ok(Json(StudentResponse::from_db(student)))
}

async fn update_student(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(student_id): Path<String>,
    Json(payload): Json<StudentUpdate>,
) -> Result<Json<StudentResponse>, ApiError> {
    validate_payload(&payload)?;
    let student = fetch_owned_student(&state, &user.id, &student_id).await?;

    let name = payload.name.as_deref().unwrap_or(&student.name);
    let classroom_id = payload.classroom_id.as_deref().unwrap_or(&student.classroom_id);
    if classroom_id != student.classroom_id {
        fetch_owned_classroom(&state, &user.id, classroom_id).await?;
    }

    let updated = repositories::students::update(
        state.db(),
        &student_id,
        name,
        classroom_id,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update student"))?
    .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    Ok(Json(StudentResponse::from_db(updated)))
}

async fn delete_student(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(student_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    fetch_owned_student(&state, &user.id, &student_id).await?;

    repositories::students::delete_by_id(state.db(), &student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete student"))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_owned_student(
    state: &AppState,
    owner_id: &str,
    student_id: &str,
) -> Result<Student, ApiError> {
    let student = repositories::students::find_by_id(state.db(), student_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load student"))?
        .ok_or_else(|| ApiError::NotFound("Student not found".to_string()))?;

    fetch_owned_classroom(state, owner_id, &student.classroom_id).await?;

    Ok(student)
}

/// Inserts with a freshly generated code and retries on a `student_code`
/// unique violation. Each attempt runs in a savepoint so a collision does
/// not poison the surrounding batch transaction.
async fn insert_with_fresh_code(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    classroom_id: &str,
    name: &str,
) -> Result<Student, ApiError> {
    for _ in 0..CODE_ATTEMPTS {
        let code = codes::generate_student_code();
        let now = primitive_now_utc();

        let mut attempt = tx
            .begin()
            .await
            .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;
        let inserted = repositories::students::create(
            &mut *attempt,
            repositories::students::CreateStudent {
                id: &Uuid::new_v4().to_string(),
                classroom_id,
                name,
                student_code: &code,
                created_at: now,
                updated_at: now,
            },
        )
        .await;

        match inserted {
            Ok(student) => {
                attempt
                    .commit()
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;
                return Ok(student);
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                attempt
                    .rollback()
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to roll back attempt"))?;
            }
            Err(e) => return Err(ApiError::internal(e, "Failed to create student")),
        }
    }
    Err(ApiError::Internal("Could not allocate a unique student code".to_string()))
}
