use serde::{Deserialize, Serialize};
use sqlx::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "questiontype", rename_all = "snake_case")]
pub(crate) enum QuestionType {
    /// Single choice: exactly one option is flagged correct.
    One,
    /// Multiple choice: any subset of options may be flagged correct.
    Multiple,
    TrueFalse,
    /// Free-form answer; never auto-graded and excluded from the score.
    Text,
}

impl QuestionType {
    pub(crate) fn is_objective(self) -> bool {
        matches!(self, QuestionType::One | QuestionType::Multiple | QuestionType::TrueFalse)
    }
}
