use serde::Serialize;

use crate::core::time::format_primitive;
use crate::db::models::StudentAnswer;
use crate::db::types::QuestionType;
use crate::repositories::results::LaunchResultRow;

#[derive(Debug, Serialize)]
pub(crate) struct LaunchResultResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) score: f64,
    pub(crate) completed_at: String,
}

impl LaunchResultResponse {
    pub(crate) fn from_row(row: LaunchResultRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            score: row.score,
            completed_at: format_primitive(row.completed_at),
        }
    }
}

/// An answer option as shown to a student. Deliberately omits `is_correct`.
#[derive(Debug, Serialize)]
pub(crate) struct AnswerOptionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentAnswerResponse {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) options: Vec<AnswerOptionResponse>,
    pub(crate) selected_answer_ids: Vec<String>,
    pub(crate) is_checked: bool,
    pub(crate) is_correct: bool,
}

impl StudentAnswerResponse {
    pub(crate) fn from_db(
        answer: StudentAnswer,
        question_text: String,
        question_type: QuestionType,
        options: Vec<AnswerOptionResponse>,
    ) -> Self {
        Self {
            question_id: answer.question_id,
            question_text,
            question_type,
            options,
            selected_answer_ids: answer.selected_answer_ids.0,
            is_checked: answer.is_checked,
            is_correct: answer.is_correct,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct StudentLaunchAnswersResponse {
    pub(crate) student_id: String,
    pub(crate) test_launch_id: String,
    pub(crate) score: Option<f64>,
    pub(crate) completed_at: Option<String>,
    pub(crate) answers: Vec<StudentAnswerResponse>,
}
