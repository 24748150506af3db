// src/exam/scoring.rs
//
// Pure scoring. Never performs I/O and never fails: malformed or unknown
// input scores zero instead of erroring.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::exam::config::MultiplePolicy;
use crate::models::question::{AnswerValue, QuestionType};

pub const FULL_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub is_correct: bool,
    pub score: f64,
}

impl ScoreResult {
    fn correct() -> Self {
        Self {
            is_correct: true,
            score: FULL_SCORE,
        }
    }

    fn wrong() -> Self {
        Self {
            is_correct: false,
            score: 0.0,
        }
    }
}

/// Scores one answer. A submitted value whose shape does not match the
/// question type is simply wrong, not an error.
pub fn score_answer(
    question_type: QuestionType,
    submitted: &AnswerValue,
    correct: &AnswerValue,
    policy: &MultiplePolicy,
) -> ScoreResult {
    match question_type {
        QuestionType::Single => match (submitted, correct) {
            (AnswerValue::Choice(a), AnswerValue::Choice(b)) if a == b => ScoreResult::correct(),
            _ => ScoreResult::wrong(),
        },
        QuestionType::Judge => match (submitted, correct) {
            (AnswerValue::Judge(a), AnswerValue::Judge(b)) if a == b => ScoreResult::correct(),
            _ => ScoreResult::wrong(),
        },
        QuestionType::Multiple => match (submitted, correct) {
            (AnswerValue::Choices(sub), AnswerValue::Choices(cor)) => {
                score_multiple(sub, cor, policy)
            }
            _ => ScoreResult::wrong(),
        },
    }
}

/// Scores against a raw wire-format type string; unrecognized types score
/// zero. This is the entry point the answer recorder uses.
pub fn score_raw(
    type_str: &str,
    submitted: &AnswerValue,
    correct: &AnswerValue,
    policy: &MultiplePolicy,
) -> ScoreResult {
    match QuestionType::parse(type_str) {
        Some(question_type) => score_answer(question_type, submitted, correct, policy),
        None => {
            tracing::warn!("scoring request with unknown question type: {}", type_str);
            ScoreResult::wrong()
        }
    }
}

fn score_multiple(submitted: &[String], correct: &[String], policy: &MultiplePolicy) -> ScoreResult {
    let submitted: BTreeSet<&str> = submitted.iter().map(String::as_str).collect();
    let correct: BTreeSet<&str> = correct.iter().map(String::as_str).collect();

    match policy {
        MultiplePolicy::Strict => {
            if submitted == correct {
                ScoreResult::correct()
            } else {
                ScoreResult::wrong()
            }
        }
        MultiplePolicy::PartialCredit { missing_penalty } => {
            if !submitted.is_subset(&correct) {
                return ScoreResult::wrong();
            }
            let missing = correct.len() - submitted.len();
            if missing == 0 {
                ScoreResult::correct()
            } else {
                ScoreResult {
                    is_correct: false,
                    score: (FULL_SCORE - missing as f64 * missing_penalty).max(0.0),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn choice(s: &str) -> AnswerValue {
        AnswerValue::Choice(s.to_string())
    }

    fn choices(items: &[&str]) -> AnswerValue {
        AnswerValue::Choices(items.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn single_exact_match() {
        let policy = MultiplePolicy::Strict;
        let hit = score_answer(QuestionType::Single, &choice("A"), &choice("A"), &policy);
        assert_eq!(hit, ScoreResult { is_correct: true, score: 1.0 });

        let miss = score_answer(QuestionType::Single, &choice("B"), &choice("A"), &policy);
        assert_eq!(miss, ScoreResult { is_correct: false, score: 0.0 });
    }

    #[test]
    fn judge_exact_match() {
        let policy = MultiplePolicy::Strict;
        let hit = score_answer(
            QuestionType::Judge,
            &AnswerValue::Judge(true),
            &AnswerValue::Judge(true),
            &policy,
        );
        assert!(hit.is_correct);
        assert_eq!(hit.score, 1.0);

        let miss = score_answer(
            QuestionType::Judge,
            &AnswerValue::Judge(false),
            &AnswerValue::Judge(true),
            &policy,
        );
        assert!(!miss.is_correct);
        assert_eq!(miss.score, 0.0);
    }

    #[test]
    fn multiple_strict_requires_set_equality() {
        let policy = MultiplePolicy::Strict;
        let correct = choices(&["A", "B"]);

        let exact = score_answer(QuestionType::Multiple, &choices(&["B", "A"]), &correct, &policy);
        assert_eq!(exact, ScoreResult { is_correct: true, score: 1.0 });

        let missing = score_answer(QuestionType::Multiple, &choices(&["A"]), &correct, &policy);
        assert_eq!(missing, ScoreResult { is_correct: false, score: 0.0 });

        let extra = score_answer(
            QuestionType::Multiple,
            &choices(&["A", "B", "C"]),
            &correct,
            &policy,
        );
        assert_eq!(extra, ScoreResult { is_correct: false, score: 0.0 });
    }

    #[test]
    fn multiple_partial_credit() {
        let policy = MultiplePolicy::PartialCredit { missing_penalty: 0.5 };
        let correct = choices(&["A", "B", "C"]);

        let complete = score_answer(QuestionType::Multiple, &choices(&["C", "A", "B"]), &correct, &policy);
        assert_eq!(complete, ScoreResult { is_correct: true, score: 1.0 });

        let one_missing = score_answer(QuestionType::Multiple, &choices(&["A", "B"]), &correct, &policy);
        assert!(!one_missing.is_correct);
        assert_eq!(one_missing.score, 0.5);

        let two_missing = score_answer(QuestionType::Multiple, &choices(&["A"]), &correct, &policy);
        assert_eq!(two_missing.score, 0.0);

        let not_subset = score_answer(QuestionType::Multiple, &choices(&["A", "D"]), &correct, &policy);
        assert_eq!(not_subset, ScoreResult { is_correct: false, score: 0.0 });
    }

    #[test]
    fn shape_mismatch_scores_zero() {
        let policy = MultiplePolicy::Strict;
        let mismatch = score_answer(
            QuestionType::Single,
            &AnswerValue::Judge(true),
            &choice("A"),
            &policy,
        );
        assert_eq!(mismatch, ScoreResult { is_correct: false, score: 0.0 });

        let mismatch = score_answer(QuestionType::Multiple, &choice("A"), &choices(&["A"]), &policy);
        assert_eq!(mismatch, ScoreResult { is_correct: false, score: 0.0 });
    }

    #[test]
    fn unknown_type_scores_zero_without_error() {
        let policy = MultiplePolicy::Strict;
        let result = score_raw("essay", &choice("A"), &choice("A"), &policy);
        assert_eq!(result, ScoreResult { is_correct: false, score: 0.0 });
    }

    #[test]
    fn multiple_comparison_is_pure_set_equality() {
        // Equality is decided on the sets alone, with no special casing:
        // two empty selections are equal.
        for policy in [
            MultiplePolicy::Strict,
            MultiplePolicy::PartialCredit { missing_penalty: 0.5 },
        ] {
            let result = score_answer(QuestionType::Multiple, &choices(&[]), &choices(&[]), &policy);
            assert_eq!(result, ScoreResult { is_correct: true, score: 1.0 });
        }
    }

    #[test]
    fn empty_multiple_submission_is_wrong_under_both_policies() {
        let correct = choices(&["A", "B"]);
        for policy in [
            MultiplePolicy::Strict,
            MultiplePolicy::PartialCredit { missing_penalty: 0.5 },
        ] {
            let result = score_answer(QuestionType::Multiple, &choices(&[]), &correct, &policy);
            assert_eq!(result, ScoreResult { is_correct: false, score: 0.0 });
        }
    }
}
