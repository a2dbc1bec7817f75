use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::api::classrooms::fetch_owned_classroom;
use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::api::tests::fetch_owned_test;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::{primitive_now_utc, to_primitive_utc};
use crate::db::models::TestLaunch;
use crate::repositories;
use crate::schemas::launch::{LaunchCreate, LaunchListQuery, LaunchResponse, LaunchUpdate};
use crate::services::codes;
use crate::services::scheduling;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_launches).post(create_launch))
        .route(
            "/:launch_id",
            get(get_launch).patch(update_launch).put(update_launch).delete(delete_launch),
        )
}

async fn create_launch(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Json(payload): Json<LaunchCreate>,
) -> Result<(StatusCode, Json<LaunchResponse>), ApiError> {
    validate_payload(&payload)?;

    let test = fetch_owned_test(&state, &user.id, &payload.test_id).await?;

    let mut classroom_ids = payload.classroom_ids.clone();
    classroom_ids.sort();
    classroom_ids.dedup();
    require_owned_classrooms(&state, &user.id, &classroom_ids).await?;

    let now = primitive_now_utc();
    let launched_at = payload.launched_at.map(to_primitive_utc).unwrap_or(now);
    let expires_at = payload.expires_at.map(to_primitive_utc);
    validate_window(launched_at, expires_at)?;

    let title = payload.title.clone().unwrap_or_else(|| test.title.clone());

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let launch = repositories::launches::create(
        &mut *tx,
        repositories::launches::CreateLaunch {
            id: &Uuid::new_v4().to_string(),
            test_id: &test.id,
            title: &title,
            session_id: &codes::generate_session_token(),
            launched_at: Some(launched_at),
            expires_at,
            is_active: true,
            created_at: now,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create test launch"))?;

    for classroom_id in &classroom_ids {
        repositories::launches::add_classroom(&mut *tx, &launch.id, classroom_id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to attach classroom"))?;
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let activity = scheduling::activity_of(&launch, primitive_now_utc());
    Ok((StatusCode::CREATED, Json(LaunchResponse::from_db(launch, activity, classroom_ids))))
}

async fn list_launches(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Query(query): Query<LaunchListQuery>,
) -> Result<Json<Vec<LaunchResponse>>, ApiError> {
    let now = primitive_now_utc();
    sweep(&state, now).await?;

    if let Some(classroom_id) = &query.classroom_id {
        require_owned_classrooms(&state, &user.id, std::slice::from_ref(classroom_id)).await?;
    }

    let launches = repositories::launches::list_by_owner(
        state.db(),
        &user.id,
        query.classroom_id.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list test launches"))?;

    let mut responses = Vec::with_capacity(launches.len());
    for launch in launches {
        let classroom_ids = repositories::launches::classroom_ids(state.db(), &launch.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load launch classrooms"))?;
        let activity = scheduling::activity_of(&launch, now);
        responses.push(LaunchResponse::from_db(launch, activity, classroom_ids));
    }

    Ok(Json(responses))
}

async fn get_launch(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(launch_id): Path<String>,
) -> Result<Json<LaunchResponse>, ApiError> {
    let now = primitive_now_utc();
    sweep(&state, now).await?;

    let launch = fetch_owned_launch(&state, &user.id, &launch_id).await?;
    let classroom_ids = repositories::launches::classroom_ids(state.db(), &launch.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load launch classrooms"))?;

    let activity = scheduling::activity_of(&launch, now);
    Ok(Json(LaunchResponse::from_db(launch, activity, classroom_ids)))
}

/// Partial update. Absent timestamp fields keep the stored value and an
/// explicit `null` clears it. A manual `is_active = true` cannot reopen a
/// launch whose deadline has already passed unless the same request moves
/// the deadline.
async fn update_launch(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(launch_id): Path<String>,
    Json(payload): Json<LaunchUpdate>,
) -> Result<Json<LaunchResponse>, ApiError> {
    validate_payload(&payload)?;

    let now = primitive_now_utc();
    sweep(&state, now).await?;
    let launch = fetch_owned_launch(&state, &user.id, &launch_id).await?;

    let title = payload.title.clone().unwrap_or_else(|| launch.title.clone());
    let launched_at = match payload.launched_at {
        Some(value) => value.map(to_primitive_utc),
        None => launch.launched_at,
    };
    let expires_at = match payload.expires_at {
        Some(value) => value.map(to_primitive_utc),
        None => launch.expires_at,
    };
    if let Some(start) = launched_at {
        validate_window(start, expires_at)?;
    }

    let requested_active = payload.is_active.unwrap_or(launch.is_active);
    let is_active = scheduling::resolve_manual_flag(requested_active, expires_at, now);

    let classroom_ids = match payload.classroom_ids.clone() {
        Some(mut ids) => {
            ids.sort();
            ids.dedup();
            if ids.is_empty() {
                return Err(ApiError::BadRequest(
                    "classroom_ids must not be empty".to_string(),
                ));
            }
            require_owned_classrooms(&state, &user.id, &ids).await?;
            Some(ids)
        }
        None => None,
    };

    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    let updated = repositories::launches::update(
        &mut *tx,
        repositories::launches::UpdateLaunch {
            id: &launch.id,
            title: &title,
            launched_at,
            expires_at,
            is_active,
            updated_at: now,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update test launch"))?;

    if let Some(ids) = &classroom_ids {
        repositories::launches::clear_classrooms(&mut *tx, &launch.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to detach classrooms"))?;
        for classroom_id in ids {
            repositories::launches::add_classroom(&mut *tx, &launch.id, classroom_id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to attach classroom"))?;
        }
    }

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    let classroom_ids = match classroom_ids {
        Some(ids) => ids,
        None => repositories::launches::classroom_ids(state.db(), &launch.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to load launch classrooms"))?,
    };

    let activity = scheduling::activity_of(&updated, now);
    Ok(Json(LaunchResponse::from_db(updated, activity, classroom_ids)))
}

async fn delete_launch(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(launch_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    fetch_owned_launch(&state, &user.id, &launch_id).await?;

    repositories::launches::delete_by_id(state.db(), &launch_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete test launch"))?;

    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_owned_launch(
    state: &AppState,
    owner_id: &str,
    launch_id: &str,
) -> Result<TestLaunch, ApiError> {
    let launch = repositories::launches::find_by_id(state.db(), launch_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test launch"))?
        .ok_or_else(|| ApiError::NotFound("Test launch not found".to_string()))?;

    fetch_owned_test(state, owner_id, &launch.test_id).await?;

    Ok(launch)
}

async fn require_owned_classrooms(
    state: &AppState,
    owner_id: &str,
    classroom_ids: &[String],
) -> Result<(), ApiError> {
    for classroom_id in classroom_ids {
        fetch_owned_classroom(state, owner_id, classroom_id).await?;
    }
    Ok(())
}

fn validate_window(
    launched_at: PrimitiveDateTime,
    expires_at: Option<PrimitiveDateTime>,
) -> Result<(), ApiError> {
    if let Some(end) = expires_at {
        if end <= launched_at {
            return Err(ApiError::BadRequest(
                "expires_at must be after launched_at".to_string(),
            ));
        }
    }
    Ok(())
}

async fn sweep(state: &AppState, now: PrimitiveDateTime) -> Result<(), ApiError> {
    let swept = repositories::launches::sweep_expired(state.db(), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sweep expired launches"))?;
    if swept > 0 {
        tracing::debug!(count = swept, "Deactivated expired test launches");
    }
    Ok(())
}
