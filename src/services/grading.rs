use std::collections::HashSet;

use crate::db::types::QuestionType;

/// Outcome of grading one question of a submission batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct GradedSelection {
    /// The student supplied at least one option for this question.
    pub(crate) is_checked: bool,
    pub(crate) is_correct: bool,
}

/// Grade a single question by exact set equality against the flagged
/// correct options. A subset or superset of the correct set is incorrect;
/// there is no partial credit. Non-objective questions are persisted
/// unchecked and ungraded.
pub(crate) fn grade_selection(
    question_type: QuestionType,
    correct_ids: &[String],
    selected_ids: &[String],
) -> GradedSelection {
    if !question_type.is_objective() {
        return GradedSelection { is_checked: false, is_correct: false };
    }

    let correct: HashSet<&str> = correct_ids.iter().map(String::as_str).collect();
    let selected: HashSet<&str> = selected_ids.iter().map(String::as_str).collect();

    GradedSelection { is_checked: !selected_ids.is_empty(), is_correct: selected == correct }
}

/// Running score over one submission batch. Only objective questions count,
/// in both the numerator and the denominator; the denominator counts every
/// objective question of the test, answered or not.
#[derive(Debug, Default)]
pub(crate) struct ScoreTally {
    objective: u32,
    correct: u32,
}

impl ScoreTally {
    pub(crate) fn record(&mut self, question_type: QuestionType, graded: GradedSelection) {
        if !question_type.is_objective() {
            return;
        }
        self.objective += 1;
        if graded.is_correct {
            self.correct += 1;
        }
    }

    /// Percentage 0-100; a test with no objective questions scores 0.
    pub(crate) fn score(&self) -> f64 {
        if self.objective == 0 {
            return 0.0;
        }
        100.0 * f64::from(self.correct) / f64::from(self.objective)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn exact_match_is_correct() {
        let graded = grade_selection(QuestionType::One, &ids(&["a2"]), &ids(&["a2"]));
        assert!(graded.is_checked);
        assert!(graded.is_correct);
    }

    #[test]
    fn wrong_option_is_incorrect() {
        let graded = grade_selection(QuestionType::One, &ids(&["a2"]), &ids(&["a3"]));
        assert!(graded.is_checked);
        assert!(!graded.is_correct);
    }

    #[test]
    fn subset_of_correct_set_is_incorrect() {
        let graded = grade_selection(QuestionType::Multiple, &ids(&["a1", "a2"]), &ids(&["a1"]));
        assert!(graded.is_checked);
        assert!(!graded.is_correct);
    }

    #[test]
    fn superset_of_correct_set_is_incorrect() {
        let graded =
            grade_selection(QuestionType::Multiple, &ids(&["a1", "a2"]), &ids(&["a1", "a2", "a3"]));
        assert!(graded.is_checked);
        assert!(!graded.is_correct);
    }

    #[test]
    fn selection_order_does_not_matter() {
        let graded =
            grade_selection(QuestionType::Multiple, &ids(&["a1", "a2"]), &ids(&["a2", "a1"]));
        assert!(graded.is_correct);
    }

    #[test]
    fn empty_selection_is_unchecked_and_incorrect() {
        let graded = grade_selection(QuestionType::One, &ids(&["a2"]), &[]);
        assert!(!graded.is_checked);
        assert!(!graded.is_correct);
    }

    #[test]
    fn true_false_grades_like_single_choice() {
        let graded = grade_selection(QuestionType::TrueFalse, &ids(&["yes"]), &ids(&["yes"]));
        assert!(graded.is_correct);
        let graded = grade_selection(QuestionType::TrueFalse, &ids(&["yes"]), &ids(&["no"]));
        assert!(!graded.is_correct);
    }

    #[test]
    fn text_question_is_never_graded() {
        let graded = grade_selection(QuestionType::Text, &[], &ids(&["a1"]));
        assert!(!graded.is_checked);
        assert!(!graded.is_correct);
    }

    #[test]
    fn grading_is_deterministic() {
        let correct = ids(&["a1", "a2"]);
        let selected = ids(&["a2", "a1"]);
        let first = grade_selection(QuestionType::Multiple, &correct, &selected);
        let second = grade_selection(QuestionType::Multiple, &correct, &selected);
        assert_eq!(first, second);
    }

    #[test]
    fn score_counts_only_objective_questions() {
        let mut tally = ScoreTally::default();
        tally.record(
            QuestionType::One,
            grade_selection(QuestionType::One, &ids(&["a1"]), &ids(&["a1"])),
        );
        tally.record(
            QuestionType::Multiple,
            grade_selection(QuestionType::Multiple, &ids(&["b1", "b2"]), &ids(&["b1"])),
        );
        // Text questions change neither numerator nor denominator.
        tally.record(QuestionType::Text, grade_selection(QuestionType::Text, &[], &[]));
        assert_eq!(tally.score(), 50.0);
    }

    #[test]
    fn unanswered_objective_question_still_counts_in_denominator() {
        let mut tally = ScoreTally::default();
        tally.record(
            QuestionType::One,
            grade_selection(QuestionType::One, &ids(&["a1"]), &ids(&["a1"])),
        );
        tally.record(QuestionType::One, grade_selection(QuestionType::One, &ids(&["b1"]), &[]));
        assert_eq!(tally.score(), 50.0);
    }

    #[test]
    fn no_objective_questions_scores_zero() {
        let tally = ScoreTally::default();
        assert_eq!(tally.score(), 0.0);
    }

    #[test]
    fn all_correct_scores_hundred() {
        let mut tally = ScoreTally::default();
        for _ in 0..3 {
            tally.record(
                QuestionType::One,
                grade_selection(QuestionType::One, &ids(&["a1"]), &ids(&["a1"])),
            );
        }
        assert_eq!(tally.score(), 100.0);
    }
}
