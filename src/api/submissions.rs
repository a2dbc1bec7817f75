use std::collections::HashMap;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::validation::validate_payload;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::submission::{SubmitAnswersRequest, SubmitAnswersResponse};
use crate::services::access;
use crate::services::grading::{grade_selection, ScoreTally};
use crate::services::scheduling;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/submit-answers", post(submit_answers))
}

/// One-shot submission for a whole launch: grades every question of the
/// test, persists the per-question breakdown and the final score in a single
/// transaction. A second submission for the same launch is rejected.
async fn submit_answers(
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswersRequest>,
) -> Result<(StatusCode, Json<SubmitAnswersResponse>), ApiError> {
    validate_payload(&payload)?;

    let now = primitive_now_utc();
    repositories::launches::sweep_expired(state.db(), now)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to sweep expired launches"))?;

    let (student, launch) =
        access::authorize_student(state.db(), &payload.student_code, &payload.test_launch_id)
            .await?;

    let activity = scheduling::activity_of(&launch, now);
    if !activity.accepts_submissions() {
        let detail = match activity {
            scheduling::LaunchActivity::Scheduled => "Test launch has not started yet",
            scheduling::LaunchActivity::Expired => "Test launch has expired",
            _ => "Test launch is closed",
        };
        return Err(ApiError::Forbidden(detail));
    }

    let existing = repositories::results::find_result(state.db(), &student.id, &launch.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check existing result"))?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "Answers for this test launch were already submitted".to_string(),
        ));
    }

    let questions = repositories::tests::questions_for_test(state.db(), &launch.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load questions"))?;
    let answers = repositories::tests::answers_for_test(state.db(), &launch.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answers"))?;

    let mut correct_by_question: HashMap<&str, Vec<String>> = HashMap::new();
    let mut options_by_question: HashMap<&str, Vec<&str>> = HashMap::new();
    for answer in &answers {
        options_by_question
            .entry(answer.question_id.as_str())
            .or_default()
            .push(answer.id.as_str());
        if answer.is_correct {
            correct_by_question
                .entry(answer.question_id.as_str())
                .or_default()
                .push(answer.id.clone());
        }
    }

    // Unknown question or answer ids void the whole batch.
    let mut selections: HashMap<&str, &[String]> = HashMap::new();
    for submitted in &payload.answers {
        if !questions.iter().any(|question| question.id == submitted.question_id) {
            return Err(ApiError::NotFound(format!(
                "Question {} does not belong to this test",
                submitted.question_id
            )));
        }
        let options = options_by_question
            .get(submitted.question_id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for selected_id in &submitted.selected_answer_ids {
            if !options.contains(&selected_id.as_str()) {
                return Err(ApiError::NotFound(format!(
                    "Answer {selected_id} does not belong to question {}",
                    submitted.question_id
                )));
            }
        }
        selections.insert(&submitted.question_id, &submitted.selected_answer_ids);
    }

    static EMPTY: &[String] = &[];
    let mut tally = ScoreTally::default();
    let mut tx = state
        .db()
        .begin()
        .await
        .map_err(|e| ApiError::internal(e, "Failed to start transaction"))?;

    // Every question of the test gets a row, answered or not.
    for question in &questions {
        let selected = selections.get(question.id.as_str()).copied().unwrap_or(EMPTY);
        let correct = correct_by_question
            .get(question.id.as_str())
            .map(Vec::as_slice)
            .unwrap_or(&[]);

        let graded = grade_selection(question.question_type, correct, selected);
        tally.record(question.question_type, graded);

        repositories::results::insert_answer(
            &mut *tx,
            repositories::results::CreateStudentAnswer {
                id: &Uuid::new_v4().to_string(),
                student_id: &student.id,
                test_launch_id: &launch.id,
                question_id: &question.id,
                selected_answer_ids: selected,
                is_checked: graded.is_checked,
                is_correct: graded.is_correct,
                created_at: now,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to store answer"))?;
    }

    let result = repositories::results::insert_result(
        &mut *tx,
        repositories::results::CreateResult {
            id: &Uuid::new_v4().to_string(),
            student_id: &student.id,
            test_launch_id: &launch.id,
            score: tally.score(),
            completed_at: now,
        },
    )
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ApiError::Conflict(
            "Answers for this test launch were already submitted".to_string(),
        ),
        _ => ApiError::internal(e, "Failed to store result"),
    })?;

    tx.commit().await.map_err(|e| ApiError::internal(e, "Failed to commit transaction"))?;

    tracing::info!(
        student_id = %result.student_id,
        test_launch_id = %result.test_launch_id,
        score = result.score,
        "Submission graded"
    );

    Ok((StatusCode::CREATED, Json(SubmitAnswersResponse::from_db(result))))
}

// These tests need a live database and skip silently when DATABASE_URL is
// not set, like the migration smoke test.
#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;
    use time::{Duration, PrimitiveDateTime};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::api::router::router;
    use crate::core::config::Settings;
    use crate::core::state::AppState;
    use crate::core::time::primitive_now_utc;
    use crate::db;
    use crate::db::types::QuestionType;
    use crate::repositories;
    use crate::services::codes;
    use crate::test_support;

    struct LaunchFixture {
        student_code: String,
        launch_id: String,
        question_id: String,
        correct_answer_id: String,
    }

    async fn connect() -> Option<PgPool> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty())?;
        let pool =
            PgPoolOptions::new().max_connections(2).connect(&url).await.expect("test pool");
        db::run_migrations(&pool).await.expect("migrations");
        Some(pool)
    }

    fn app(pool: PgPool) -> axum::Router {
        let _guard = test_support::env_lock();
        std::env::set_var("SECRET_KEY", "test-secret");
        std::env::remove_var("PROMETHEUS_ENABLED");
        let settings = Settings::load().expect("settings");
        router(AppState::new(settings, pool))
    }

    async fn seed_launch(pool: &PgPool, expires_at: Option<PrimitiveDateTime>) -> LaunchFixture {
        let now = primitive_now_utc();

        let user_id = Uuid::new_v4().to_string();
        let username = format!("teacher-{}", Uuid::new_v4().simple());
        repositories::users::create(
            pool,
            repositories::users::CreateUser {
                id: &user_id,
                username: &username,
                hashed_password: "not-a-real-hash".to_string(),
                full_name: "Fixture Teacher",
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .expect("user");

        let classroom_id = Uuid::new_v4().to_string();
        repositories::classrooms::create(
            pool,
            repositories::classrooms::CreateClassroom {
                id: &classroom_id,
                name: "5A",
                owner_id: &user_id,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .expect("classroom");

        let student_code = codes::generate_student_code();
        let student_id = Uuid::new_v4().to_string();
        repositories::students::create(
            pool,
            repositories::students::CreateStudent {
                id: &student_id,
                classroom_id: &classroom_id,
                name: "Fixture Student",
                student_code: &student_code,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .expect("student");

        let test_id = Uuid::new_v4().to_string();
        repositories::tests::create(
            pool,
            repositories::tests::CreateTest {
                id: &test_id,
                title: "Fractions quiz",
                description: None,
                created_by: &user_id,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .expect("test");

        let question_id = Uuid::new_v4().to_string();
        repositories::tests::insert_question(
            pool,
            repositories::tests::CreateQuestion {
                id: &question_id,
                test_id: &test_id,
                text: "What is 1/2 + 1/2?",
                question_type: QuestionType::One,
                order_index: 0,
            },
        )
        .await
        .expect("question");

        let correct_answer_id = Uuid::new_v4().to_string();
        repositories::tests::insert_answer(
            pool,
            repositories::tests::CreateAnswer {
                id: &correct_answer_id,
                question_id: &question_id,
                text: "1",
                is_correct: true,
                order_index: 0,
            },
        )
        .await
        .expect("answer");
        repositories::tests::insert_answer(
            pool,
            repositories::tests::CreateAnswer {
                id: &Uuid::new_v4().to_string(),
                question_id: &question_id,
                text: "2",
                is_correct: false,
                order_index: 1,
            },
        )
        .await
        .expect("answer");

        let launch_id = Uuid::new_v4().to_string();
        repositories::launches::create(
            pool,
            repositories::launches::CreateLaunch {
                id: &launch_id,
                test_id: &test_id,
                title: "Fractions quiz",
                session_id: &codes::generate_session_token(),
                launched_at: Some(now - Duration::minutes(5)),
                expires_at,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .expect("launch");
        repositories::launches::add_classroom(pool, &launch_id, &classroom_id)
            .await
            .expect("launch classroom");

        LaunchFixture { student_code, launch_id, question_id, correct_answer_id }
    }

    async fn post_submission(
        app: axum::Router,
        body: &serde_json::Value,
    ) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/submit-answers")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .expect("response")
    }

    #[tokio::test]
    async fn second_submission_for_same_launch_is_conflict() {
        let Some(pool) = connect().await else { return };
        let fixture = seed_launch(&pool, Some(primitive_now_utc() + Duration::hours(1))).await;

        let body = serde_json::json!({
            "student_code": fixture.student_code,
            "test_launch_id": fixture.launch_id,
            "answers": [{
                "question_id": fixture.question_id,
                "selected_answer_ids": [fixture.correct_answer_id],
            }],
        });

        let first = post_submission(app(pool.clone()), &body).await;
        assert_eq!(first.status(), StatusCode::CREATED);
        let bytes = to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["score"], 100.0);

        let second = post_submission(app(pool.clone()), &body).await;
        assert_eq!(second.status(), StatusCode::CONFLICT);

        let results: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM student_test_results WHERE test_launch_id = $1",
        )
        .bind(&fixture.launch_id)
        .fetch_one(&pool)
        .await
        .expect("result count");
        assert_eq!(results, 1);
    }

    #[tokio::test]
    async fn expired_launch_is_swept_and_rejects_submissions() {
        let Some(pool) = connect().await else { return };
        let fixture = seed_launch(&pool, Some(primitive_now_utc() - Duration::hours(1))).await;

        let body = serde_json::json!({
            "student_code": fixture.student_code,
            "test_launch_id": fixture.launch_id,
            "answers": [{
                "question_id": fixture.question_id,
                "selected_answer_ids": [fixture.correct_answer_id],
            }],
        });

        let response = post_submission(app(pool.clone()), &body).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["detail"], "Test launch has expired");

        // The read path itself must have flipped the stale flag off.
        let launch = repositories::launches::find_by_id(&pool, &fixture.launch_id)
            .await
            .expect("load launch")
            .expect("launch exists");
        assert!(!launch.is_active);

        let results: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM student_test_results WHERE test_launch_id = $1",
        )
        .bind(&fixture.launch_id)
        .fetch_one(&pool)
        .await
        .expect("result count");
        assert_eq!(results, 0);
    }
}
