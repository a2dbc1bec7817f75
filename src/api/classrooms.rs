use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::validation::{validate_payload, SingleOrBatch};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::Classroom;
use crate::repositories;
use crate::schemas::classroom::{ClassroomCreate, ClassroomResponse, ClassroomUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_classrooms).post(create_classroom))
        .route("/:classroom_id", get(get_classroom).put(update_classroom).delete(delete_classroom))
}

/// Accepts one classroom or a list; the response shape mirrors the request.
async fn create_classroom(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Json(payload): Json<SingleOrBatch<ClassroomCreate>>,
) -> Result<Response, ApiError> {
    let batch = payload.is_batch();
    let items = payload.into_vec();
    if items.is_empty() {
        return Err(ApiError::BadRequest("At least one classroom is required".to_string()));
    }
    for item in &items {
        validate_payload(item)?;
    }

    let mut created = Vec::with_capacity(items.len());
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    for item in &items {
        let now = primitive_now_utc();
        let classroom = repositories::classrooms::create(
            &mut *tx,
            repositories::classrooms::CreateClassroom {
                id: &Uuid::new_v4().to_string(),
                name: &item.name,
                owner_id: &user.id,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create classroom"))?;
        created.push(ClassroomResponse::from_db(classroom));
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let response = if batch {
        (StatusCode::CREATED, Json(created)).into_response()
    } else {
        let single = created
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Internal("Created classroom went missing".to_string()))?;
        (StatusCode::CREATED, Json(single)).into_response()
    };
    Ok(response)
}

async fn list_classrooms(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
) -> Result<Json<Vec<ClassroomResponse>>, ApiError> {
    let classrooms = repositories::classrooms::list_by_owner(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list classrooms"))?;

    Ok(Json(classrooms.into_iter().map(ClassroomResponse::from_db).collect()))
}

async fn get_classroom(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(classroom_id): Path<String>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    let classroom = fetch_owned_classroom(&state, &user.id, &classroom_id).await?;
    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn update_classroom(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(classroom_id): Path<String>,
    Json(payload): Json<ClassroomUpdate>,
) -> Result<Json<ClassroomResponse>, ApiError> {
    validate_payload(&payload)?;
    fetch_owned_classroom(&state, &user.id, &classroom_id).await?;

    let classroom =
        repositories::classrooms::rename(state.db(), &classroom_id, &payload.name, primitive_now_utc())
            .await
            .map_err(|e| ApiError::internal(e, "Failed to update classroom"))?
            .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;

    Ok(Json(ClassroomResponse::from_db(classroom)))
}

async fn delete_classroom(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(classroom_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    fetch_owned_classroom(&state, &user.id, &classroom_id).await?;

    repositories::classrooms::delete_by_id(state.db(), &classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete classroom"))?;

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn fetch_owned_classroom(
    state: &AppState,
    owner_id: &str,
    classroom_id: &str,
) -> Result<Classroom, ApiError> {
    let classroom = repositories::classrooms::find_by_id(state.db(), classroom_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load classroom"))?
        .ok_or_else(|| ApiError::NotFound("Classroom not found".to_string()))?;

    if classroom.owner_id != owner_id {
        return Err(ApiError::Forbidden("Not enough permissions for this classroom"));
    }

    Ok(classroom)
}
