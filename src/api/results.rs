use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentTeacher;
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::repositories;
use crate::schemas::result::{
    AnswerOptionResponse, LaunchResultResponse, StudentAnswerResponse,
    StudentLaunchAnswersResponse,
};
use crate::services::access;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/results/:launch_id", get(launch_results))
        .route("/student/:student_code/launch/:launch_id/answers", get(student_answers))
}

/// Scoreboard for one launch. A launch owned by another teacher yields an
/// empty list rather than an error, so the endpoint leaks nothing about
/// launches outside the caller's account.
async fn launch_results(
    State(state): State<AppState>,
    CurrentTeacher(user): CurrentTeacher,
    Path(launch_id): Path<String>,
) -> Result<Json<Vec<LaunchResultResponse>>, ApiError> {
    repositories::launches::sweep_expired(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sweep expired launches"))?;

    let owner = repositories::launches::owner_of(state.db(), &launch_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load test launch"))?;

    match owner {
        Some(owner_id) if owner_id == user.id => {}
        _ => return Ok(Json(Vec::new())),
    }

    let rows = repositories::results::list_for_launch(state.db(), &launch_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list results"))?;

    Ok(Json(rows.into_iter().map(LaunchResultResponse::from_row).collect()))
}

/// A student's own graded breakdown, addressed by their opaque code. No
/// bearer token: the code is the credential.
async fn student_answers(
    State(state): State<AppState>,
    Path((student_code, launch_id)): Path<(String, String)>,
) -> Result<Json<StudentLaunchAnswersResponse>, ApiError> {
    repositories::launches::sweep_expired(state.db(), primitive_now_utc())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sweep expired launches"))?;

    let (student, launch) =
        access::authorize_student(state.db(), &student_code, &launch_id).await?;

    let result = repositories::results::find_result(state.db(), &student.id, &launch.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load result"))?;

    let answers = repositories::results::answers_for_student(state.db(), &student.id, &launch.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    let questions = repositories::tests::questions_for_test(state.db(), &launch.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let options = repositories::tests::answers_for_test(state.db(), &launch.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answer options"))?;

    let mut options_by_question: HashMap<String, Vec<AnswerOptionResponse>> = HashMap::new();
    for option in options {
        options_by_question
            .entry(option.question_id.clone())
            .or_default()
            .push(AnswerOptionResponse { id: option.id, text: option.text });
    }

    let mut questions_by_id: HashMap<String, _> = questions
        .into_iter()
        .map(|question| (question.id.clone(), (question.text, question.question_type)))
        .collect();

    let answers = answers
        .into_iter()
        .filter_map(|answer| {
            let options = options_by_question.remove(&answer.question_id).unwrap_or_default();
            questions_by_id.remove(&answer.question_id).map(|(text, question_type)| {
                StudentAnswerResponse::from_db(answer, text, question_type, options)
            })
        })
        .collect();

    Ok(Json(StudentLaunchAnswersResponse {
        student_id: student.id,
        test_launch_id: launch.id,
        score: result.as_ref().map(|r| r.score),
        completed_at: result.map(|r| format_primitive(r.completed_at)),
        answers,
    }))
}
