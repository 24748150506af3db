// src/exam/config.rs

use serde::{Deserialize, Serialize};

use crate::models::question::QuestionType;

/// Ordering strategy applied on top of the canonical type blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamMode {
    Random,
    UnansweredFirst,
    WrongFirst,
}

/// Canonical block order of the assembled paper. Fixed per configuration;
/// once a session is created its order never changes (the UI numbers
/// questions by contiguous type block).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockOrder {
    JudgeSingleMultiple,
    SingleMultipleJudge,
}

impl BlockOrder {
    pub fn sequence(&self) -> [QuestionType; 3] {
        match self {
            BlockOrder::JudgeSingleMultiple => [
                QuestionType::Judge,
                QuestionType::Single,
                QuestionType::Multiple,
            ],
            BlockOrder::SingleMultipleJudge => [
                QuestionType::Single,
                QuestionType::Multiple,
                QuestionType::Judge,
            ],
        }
    }
}

/// Scoring policy for multiple-choice questions. The two historical
/// policies are mutually exclusive; a session scores every answer under the
/// one policy frozen into its configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum MultiplePolicy {
    /// All-or-nothing set equality.
    Strict,
    /// Non-subset selections score zero; incomplete subsets lose
    /// `missing_penalty` per missing member, floored at zero.
    PartialCredit { missing_penalty: f64 },
}

/// Versioned exam configuration. Frozen into the session row at creation;
/// time limit, counts and thresholds are never re-derived from the active
/// defaults afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamConfig {
    pub version: String,
    pub single_choice_count: usize,
    pub multiple_choice_count: usize,
    pub judge_count: usize,
    pub total_questions: usize,
    /// Seconds. Advisory unless `enforce_time_limit` is set.
    pub time_limit: i64,
    pub passing_score: f64,
    pub block_order: BlockOrder,
    pub multiple_policy: MultiplePolicy,
    /// When true, answer writes after expiry (or after completion) are
    /// refused instead of merely being the caller's problem.
    pub enforce_time_limit: bool,
}

impl ExamConfig {
    /// Current deployment configuration: 100 questions in 90 minutes,
    /// pass at 60.
    pub fn standard() -> Self {
        Self {
            version: "standard-100".to_string(),
            single_choice_count: 40,
            multiple_choice_count: 20,
            judge_count: 40,
            total_questions: 100,
            time_limit: 5400,
            passing_score: 60.0,
            block_order: BlockOrder::JudgeSingleMultiple,
            multiple_policy: MultiplePolicy::Strict,
            enforce_time_limit: false,
        }
    }

    /// Historical 80-question revision, threshold scaled accordingly.
    pub fn compact() -> Self {
        Self {
            version: "compact-80".to_string(),
            single_choice_count: 40,
            multiple_choice_count: 20,
            judge_count: 20,
            total_questions: 80,
            time_limit: 4500,
            passing_score: 48.0,
            block_order: BlockOrder::SingleMultipleJudge,
            multiple_policy: MultiplePolicy::PartialCredit {
                missing_penalty: 0.5,
            },
            enforce_time_limit: false,
        }
    }

    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "standard" => Some(Self::standard()),
            "compact" => Some(Self::compact()),
            _ => None,
        }
    }

    pub fn count_for(&self, question_type: QuestionType) -> usize {
        match question_type {
            QuestionType::Single => self.single_choice_count,
            QuestionType::Multiple => self.multiple_choice_count,
            QuestionType::Judge => self.judge_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_counts_sum_to_total() {
        for config in [ExamConfig::standard(), ExamConfig::compact()] {
            assert_eq!(
                config.single_choice_count + config.multiple_choice_count + config.judge_count,
                config.total_questions,
                "{}",
                config.version
            );
        }
    }

    #[test]
    fn unknown_preset_is_none() {
        assert!(ExamConfig::preset("legacy-2019").is_none());
        assert!(ExamConfig::preset("standard").is_some());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ExamConfig::compact();
        let json = serde_json::to_string(&config).unwrap();
        let back: ExamConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn block_order_sequences() {
        use QuestionType::*;
        assert_eq!(
            BlockOrder::JudgeSingleMultiple.sequence(),
            [Judge, Single, Multiple]
        );
        assert_eq!(
            BlockOrder::SingleMultipleJudge.sequence(),
            [Single, Multiple, Judge]
        );
    }
}
