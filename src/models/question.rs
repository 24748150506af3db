// src/models/question.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Question type. The wire format uses lowercase strings ('single',
/// 'multiple', 'judge'); anything else is rejected at the scoring boundary
/// with a zero-score result rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionType {
    Single,
    Multiple,
    Judge,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Judge => "judge",
        }
    }

    /// Parses a wire-format type string. Unknown strings yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "single" => Some(QuestionType::Single),
            "multiple" => Some(QuestionType::Multiple),
            "judge" => Some(QuestionType::Judge),
            _ => None,
        }
    }
}

/// Answer value, tagged by shape. Replaces the untyped
/// `string | string[] | boolean` union of the legacy JSON with a variant the
/// scoring engine can match exhaustively.
///
/// Serialized untagged so the wire format stays a plain letter, letter array
/// or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Judge(bool),
    Choice(String),
    Choices(Vec<String>),
}

/// A single exam question. Ids are unique within one category's pool, not
/// globally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub question: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    /// Letter -> text. Absent for judge questions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    pub correct_answer: AnswerValue,
}

impl Question {
    /// Checks the structural invariants: the correct-answer shape must match
    /// the question type, and single/multiple questions must carry a
    /// non-empty options map. Returns the violated rule for diagnostics.
    pub fn validity(&self) -> Result<(), &'static str> {
        match (self.question_type, &self.correct_answer) {
            (QuestionType::Single, AnswerValue::Choice(_)) => {}
            (QuestionType::Multiple, AnswerValue::Choices(letters)) => {
                if letters.is_empty() {
                    return Err("multiple question with empty correct answer");
                }
            }
            (QuestionType::Judge, AnswerValue::Judge(_)) => return Ok(()),
            _ => return Err("correct answer shape does not match question type"),
        }
        match &self.options {
            Some(options) if !options.is_empty() => Ok(()),
            _ => Err("choice question without options"),
        }
    }
}
