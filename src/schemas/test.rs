use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::{Answer, Question, Test};
use crate::db::types::QuestionType;
use crate::repositories::tests::TestSummaryRow;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct AnswerCreate {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default)]
    #[serde(alias = "isCorrect")]
    pub(crate) is_correct: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[validate(length(min = 1, message = "text must not be empty"))]
    pub(crate) text: String,
    #[serde(default = "default_question_type")]
    #[serde(alias = "questionType", alias = "type")]
    pub(crate) question_type: QuestionType,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) answers: Vec<AnswerCreate>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

/// A full replacement: metadata plus the complete new question list.
#[derive(Debug, Deserialize, Validate)]
pub(crate) struct TestUpdate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub(crate) questions: Vec<QuestionCreate>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) is_correct: bool,
    pub(crate) order_index: i32,
}

impl AnswerResponse {
    pub(crate) fn from_db(answer: Answer) -> Self {
        Self {
            id: answer.id,
            text: answer.text,
            is_correct: answer.is_correct,
            order_index: answer.order_index,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) text: String,
    pub(crate) question_type: QuestionType,
    pub(crate) order_index: i32,
    pub(crate) answers: Vec<AnswerResponse>,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question, answers: Vec<AnswerResponse>) -> Self {
        Self {
            id: question.id,
            text: question.text,
            question_type: question.question_type,
            order_index: question.order_index,
            answers,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
    pub(crate) questions: Vec<QuestionResponse>,
}

impl TestResponse {
    pub(crate) fn from_db(test: Test, questions: Vec<QuestionResponse>) -> Self {
        Self {
            id: test.id,
            title: test.title,
            description: test.description,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
            questions,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TestSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: Option<String>,
    pub(crate) questions_count: i64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl TestSummaryResponse {
    pub(crate) fn from_row(row: TestSummaryRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            questions_count: row.questions_count,
            created_at: format_primitive(row.created_at),
            updated_at: format_primitive(row.updated_at),
        }
    }
}

fn default_question_type() -> QuestionType {
    QuestionType::One
}
