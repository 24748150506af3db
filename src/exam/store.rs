// src/exam/store.rs

use std::collections::HashSet;

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::exam::assembler::AnswerHistory;
use crate::exam::bank::Category;
use crate::exam::config::ExamConfig;
use crate::exam::scoring::ScoreResult;
use crate::models::question::{AnswerValue, Question};
use crate::models::session::{ExamAnswer, ExamSession, HistorySessionRow};

/// Repository over the exam tables. Every operation is a single storage
/// round trip; the caller owns any cross-operation sequencing (notably
/// "all answers written" before "finalize").
#[derive(Clone)]
pub struct ExamStore {
    pool: PgPool,
}

impl ExamStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates a session with its question snapshot in one insert. If the
    /// insert fails there is no session at all, never a session without
    /// its snapshot.
    pub async fn create_session(
        &self,
        user_id: i64,
        category: Category,
        config: &ExamConfig,
        questions: &[Question],
    ) -> Result<Uuid, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO exam_sessions
                (id, user_id, category, questions, config, total_questions, time_limit)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(category.as_str())
        .bind(Json(questions))
        .bind(Json(config))
        .bind(config.total_questions as i32)
        .bind(config.time_limit as i32)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("failed to create exam session: {:?}", e);
            AppError::from(e)
        })?;
        Ok(id)
    }

    pub async fn get_session(&self, id: Uuid) -> Result<Option<ExamSession>, AppError> {
        let session = sqlx::query_as::<_, ExamSession>(
            r#"
            SELECT id, user_id, category, start_time, end_time, questions,
                   config, total_questions, time_limit, is_completed, score
            FROM exam_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(session)
    }

    /// Rewrites a session's question snapshot. Reserved for the corrective
    /// reordering pass; nothing else may touch the snapshot.
    pub async fn update_session_questions(
        &self,
        id: Uuid,
        questions: &[Question],
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE exam_sessions SET questions = $2 WHERE id = $1")
            .bind(id)
            .bind(Json(questions))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Upserts one answer keyed by (session, question). Last write wins;
    /// the session aggregate is untouched (totals are computed lazily at
    /// finalize time).
    pub async fn upsert_answer(
        &self,
        session_id: Uuid,
        question_id: i64,
        question_type: &str,
        user_answer: &AnswerValue,
        correct_answer: &AnswerValue,
        result: &ScoreResult,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO exam_answers
                (session_id, question_id, question_type, user_answer,
                 correct_answer, is_correct, score, answered_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, CURRENT_TIMESTAMP)
            ON CONFLICT (session_id, question_id) DO UPDATE SET
                question_type = EXCLUDED.question_type,
                user_answer = EXCLUDED.user_answer,
                correct_answer = EXCLUDED.correct_answer,
                is_correct = EXCLUDED.is_correct,
                score = EXCLUDED.score,
                answered_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(session_id)
        .bind(question_id)
        .bind(question_type)
        .bind(Json(user_answer))
        .bind(Json(correct_answer))
        .bind(result.is_correct)
        .bind(result.score)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!("failed to upsert answer: {:?}", e);
            AppError::from(e)
        })?;
        Ok(())
    }

    /// Finalizes a session: completion flag, end timestamp and the summed
    /// score in one atomic update. Idempotent: re-running recomputes the
    /// same sum. Returns `None` for an unknown session.
    pub async fn complete_session(&self, id: Uuid) -> Result<Option<f64>, AppError> {
        let score = sqlx::query_scalar::<_, Option<f64>>(
            r#"
            UPDATE exam_sessions
            SET is_completed = TRUE,
                end_time = CURRENT_TIMESTAMP,
                score = COALESCE(
                    (SELECT SUM(score) FROM exam_answers WHERE session_id = $1), 0)
            WHERE id = $1
            RETURNING score
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(score.map(|s| s.unwrap_or(0.0)))
    }

    pub async fn list_completed_sessions(
        &self,
        user_id: i64,
    ) -> Result<Vec<HistorySessionRow>, AppError> {
        let rows = sqlx::query_as::<_, HistorySessionRow>(
            r#"
            SELECT s.id, s.start_time, s.end_time, s.score, s.total_questions, s.config,
                   COUNT(a.question_id) FILTER (WHERE NOT a.is_correct) AS wrong_count
            FROM exam_sessions s
            LEFT JOIN exam_answers a ON a.session_id = s.id
            WHERE s.user_id = $1 AND s.is_completed
            GROUP BY s.id
            ORDER BY s.start_time DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_session_answers(&self, session_id: Uuid) -> Result<Vec<ExamAnswer>, AppError> {
        let answers = sqlx::query_as::<_, ExamAnswer>(
            r#"
            SELECT session_id, question_id, question_type, user_answer,
                   correct_answer, is_correct, score, answered_at
            FROM exam_answers
            WHERE session_id = $1
            ORDER BY question_id
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(answers)
    }

    /// The user's answer history across all of their sessions, deduplicated
    /// by question id. Feeds the unanswered_first / wrong_first modes.
    pub async fn answer_history(&self, user_id: i64) -> Result<AnswerHistory, AppError> {
        let answered: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT a.question_id
            FROM exam_answers a
            JOIN exam_sessions s ON s.id = a.session_id
            WHERE s.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let wrong: Vec<i64> = sqlx::query_scalar(
            r#"
            SELECT DISTINCT a.question_id
            FROM exam_answers a
            JOIN exam_sessions s ON s.id = a.session_id
            WHERE s.user_id = $1 AND NOT a.is_correct
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(AnswerHistory {
            answered: HashSet::from_iter(answered),
            wrong: HashSet::from_iter(wrong),
        })
    }
}
