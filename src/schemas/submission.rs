use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::StudentTestResult;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerSubmission {
    #[serde(alias = "questionId")]
    #[validate(length(min = 1, message = "question_id must not be empty"))]
    pub(crate) question_id: String,
    #[serde(default)]
    #[serde(alias = "selectedAnswerIds")]
    pub(crate) selected_answer_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct SubmitAnswersRequest {
    #[serde(alias = "studentCode")]
    #[validate(length(equal = 12, message = "student_code must be 12 characters"))]
    pub(crate) student_code: String,
    #[serde(alias = "testLaunchId")]
    #[validate(length(min = 1, message = "test_launch_id must not be empty"))]
    pub(crate) test_launch_id: String,
    #[validate(nested)]
    pub(crate) answers: Vec<AnswerSubmission>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubmitAnswersResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) test_launch_id: String,
    pub(crate) score: f64,
    pub(crate) completed_at: String,
}

impl SubmitAnswersResponse {
    pub(crate) fn from_db(result: StudentTestResult) -> Self {
        Self {
            id: result.id,
            student_id: result.student_id,
            test_launch_id: result.test_launch_id,
            score: result.score,
            completed_at: format_primitive(result.completed_at),
        }
    }
}
