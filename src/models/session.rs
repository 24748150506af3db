// src/models/session.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::exam::bank::Category;
use crate::exam::config::{ExamConfig, ExamMode};
use crate::models::question::{AnswerValue, Question};

/// Represents the 'exam_sessions' table.
///
/// `questions` is the immutable snapshot handed to the user at creation;
/// it is only ever rewritten by the one-time reorder-repair path. `config`
/// is the exam configuration active when the session was created.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamSession {
    pub id: Uuid,
    pub user_id: i64,
    pub category: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub questions: Json<Vec<Question>>,
    pub config: Json<ExamConfig>,
    pub total_questions: i32,
    pub time_limit: i32,
    pub is_completed: bool,
    pub score: Option<f64>,
}

impl ExamSession {
    /// Seconds elapsed since the session started, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        (now - self.start_time).num_seconds().max(0)
    }

    /// Seconds left on the configured time limit, floored at zero.
    pub fn remaining_seconds(&self, now: DateTime<Utc>) -> i64 {
        (self.config.time_limit - self.elapsed_seconds(now)).max(0)
    }
}

/// Represents the 'exam_answers' table. Natural key (session_id,
/// question_id); resubmission overwrites in place.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ExamAnswer {
    pub session_id: Uuid,
    pub question_id: i64,
    pub question_type: String,
    pub user_answer: Json<AnswerValue>,
    /// Denormalized copy captured at answer time, never re-looked-up.
    pub correct_answer: Json<AnswerValue>,
    pub is_correct: bool,
    pub score: f64,
    pub answered_at: DateTime<Utc>,
}

/// Row joined from `exam_sessions` and an aggregate over `exam_answers`
/// for the history view.
#[derive(Debug, FromRow)]
pub struct HistorySessionRow {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub score: Option<f64>,
    pub total_questions: i32,
    pub config: Json<ExamConfig>,
    pub wrong_count: i64,
}

/// DTO for starting (or resuming) an exam.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExamRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub mode: Option<ExamMode>,
    #[serde(default)]
    pub category: Option<Category>,
}

/// Client-facing slice of the session's configuration. On resume the time
/// limit is the remaining time, not the configured total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientExamConfig {
    pub time_limit: i64,
    pub total_questions: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartExamResponse {
    pub session_id: Uuid,
    pub questions: Vec<Question>,
    pub config: ClientExamConfig,
}

/// DTO for recording one answer. All fields are required; a payload
/// missing any of them is rejected before the scoring engine runs.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerRequest {
    pub session_id: Uuid,
    pub question_id: i64,
    pub question_type: String,
    pub user_answer: AnswerValue,
    pub correct_answer: AnswerValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswerResponse {
    pub is_correct: bool,
    pub score: f64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteExamRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteExamResponse {
    pub total_score: f64,
    pub passed: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds between start and end; zero when the end time is absent.
    pub duration: i64,
    pub score: f64,
    pub total_questions: i32,
    pub passed: bool,
    pub wrong_answers_count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_completed: bool,
    pub time_limit: i32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_questions: i32,
    pub answered_questions: usize,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub total_score: f64,
    pub passed: bool,
    pub duration: i64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeStats {
    pub total: usize,
    pub correct: usize,
    pub score: f64,
}

#[derive(Debug, Default, PartialEq, Serialize)]
pub struct TypeStatsBreakdown {
    pub single: TypeStats,
    pub multiple: TypeStats,
    pub judge: TypeStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question: String,
    pub question_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<BTreeMap<String, String>>,
    pub user_answer: AnswerValue,
    pub correct_answer: AnswerValue,
    pub is_correct: bool,
    pub score: f64,
    pub answered_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResultsResponse {
    pub exam_session: SessionSummary,
    pub stats: SessionStats,
    pub type_stats: TypeStatsBreakdown,
    pub answer_details: Vec<AnswerDetail>,
}
