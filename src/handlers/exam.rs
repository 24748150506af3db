// src/handlers/exam.rs

use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    exam::{
        assembler::{AnswerHistory, assemble, repair_snapshot},
        bank::{Category, QuestionBank},
        config::{ExamConfig, ExamMode},
        report,
        scoring::score_raw,
        store::ExamStore,
    },
    models::session::{
        ClientExamConfig, CompleteExamRequest, CompleteExamResponse, ExamSession, HistoryResponse,
        StartExamRequest, StartExamResponse, SubmitAnswerRequest, SubmitAnswerResponse,
    },
    state::AppState,
    utils::jwt::Claims,
};

const SESSION_NOT_FOUND: &str = "考试会话不存在";

/// Starts a new exam session, or resumes an existing one when a session id
/// is supplied.
///
/// Creation assembles the paper from the category pool, applies the
/// requested ordering mode and persists the snapshot together with the
/// active configuration in a single insert. Resuming returns the persisted
/// snapshot (after the corrective reordering pass, if needed) with the
/// remaining time instead of the full limit.
pub async fn start_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;

    if let Some(session_id) = req.session_id {
        return resume_exam(&state.store, session_id, user_id).await;
    }

    let category = req.category.unwrap_or(Category::C);
    let loaded = state.bank.load(category)?;
    let config = state.config.exam.clone();

    // Mode-dependent history comes from all of the user's past sessions.
    let history = match req.mode {
        Some(ExamMode::UnansweredFirst) | Some(ExamMode::WrongFirst) => {
            state.store.answer_history(user_id).await?
        }
        _ => AnswerHistory::empty(),
    };

    let questions = assemble(&loaded.pool, &config, req.mode, &history, &mut rand::rng())?;

    let session_id = state
        .store
        .create_session(user_id, category, &config, &questions)
        .await?;

    tracing::info!(
        "user {} started exam session {} (category {}, {} questions)",
        user_id,
        session_id,
        category,
        questions.len()
    );

    Ok(Json(StartExamResponse {
        session_id,
        questions,
        config: ClientExamConfig {
            time_limit: config.time_limit,
            total_questions: config.total_questions as i64,
        },
    }))
}

async fn resume_exam(
    store: &ExamStore,
    session_id: Uuid,
    user_id: i64,
) -> Result<Json<StartExamResponse>, AppError> {
    let session = fetch_owned_session(store, session_id, user_id).await?;

    let config: ExamConfig = session.config.0.clone();
    let mut questions = session.questions.0.clone();

    // Corrective pass: a snapshot whose type blocks drifted out of the
    // canonical layout is regrouped and persisted before it is returned.
    if let Some(fixed) = repair_snapshot(&questions, &config) {
        tracing::warn!(
            "session {}: snapshot blocks out of order, persisting regrouped snapshot",
            session_id
        );
        store.update_session_questions(session_id, &fixed).await?;
        questions = fixed;
    }

    let remaining = session.remaining_seconds(Utc::now());

    Ok(Json(StartExamResponse {
        session_id,
        questions,
        config: ClientExamConfig {
            time_limit: remaining,
            total_questions: session.total_questions as i64,
        },
    }))
}

/// Records one answer: scores it under the session's frozen policy and
/// upserts the (session, question) row. Resubmitting the same question
/// overwrites the prior answer; nothing else on the session changes.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let session = fetch_owned_session(&state.store, req.session_id, user_id).await?;

    let config = &session.config.0;
    if config.enforce_time_limit
        && (session.is_completed || session.remaining_seconds(Utc::now()) == 0)
    {
        return Err(AppError::BadRequest("考试时间已结束".to_string()));
    }

    let result = score_raw(
        &req.question_type,
        &req.user_answer,
        &req.correct_answer,
        &config.multiple_policy,
    );

    state
        .store
        .upsert_answer(
            req.session_id,
            req.question_id,
            &req.question_type,
            &req.user_answer,
            &req.correct_answer,
            &result,
        )
        .await?;

    Ok(Json(SubmitAnswerResponse {
        is_correct: result.is_correct,
        score: result.score,
        message: if result.is_correct {
            "答案正确！".to_string()
        } else {
            "答案错误".to_string()
        },
    }))
}

/// Finalizes a session: sums recorded answer scores, stamps completion and
/// end time, and reports pass/fail against the session's own threshold.
/// Safe to call repeatedly.
pub async fn complete_exam(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CompleteExamRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let session = fetch_owned_session(&state.store, req.session_id, user_id).await?;

    let total_score = state
        .store
        .complete_session(req.session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.to_string()))?;

    let passed = total_score >= session.config.passing_score;

    tracing::info!(
        "session {} finalized: score {} ({})",
        req.session_id,
        total_score,
        if passed { "passed" } else { "failed" }
    );

    Ok(Json(CompleteExamResponse {
        total_score,
        passed,
        message: if passed {
            "恭喜，考试通过！".to_string()
        } else {
            "很遗憾，考试未通过".to_string()
        },
    }))
}

/// Lists the user's completed sessions, newest first.
pub async fn exam_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let rows = state.store.list_completed_sessions(user_id).await?;
    let history = rows.iter().map(report::history_entry).collect();
    Ok(Json(HistoryResponse { history }))
}

/// Per-session results: answers joined against the category pool, overall
/// stats and the per-type breakdown.
pub async fn exam_results(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let user_id = claims.user_id()?;
    let session = fetch_owned_session(&state.store, session_id, user_id).await?;

    let answers = state.store.list_session_answers(session_id).await?;
    let pool = load_session_pool(&state.bank, &session)?;

    Ok(Json(report::build_results(&session, &answers, &pool.pool)))
}

/// Loads a session and checks ownership. A session belonging to someone
/// else is indistinguishable from a missing one.
async fn fetch_owned_session(
    store: &ExamStore,
    session_id: Uuid,
    user_id: i64,
) -> Result<ExamSession, AppError> {
    let session = store
        .get_session(session_id)
        .await?
        .ok_or_else(|| AppError::NotFound(SESSION_NOT_FOUND.to_string()))?;

    if session.user_id != user_id {
        return Err(AppError::NotFound(SESSION_NOT_FOUND.to_string()));
    }

    Ok(session)
}

fn load_session_pool(
    bank: &Arc<QuestionBank>,
    session: &ExamSession,
) -> Result<Arc<crate::exam::bank::LoadedPool>, AppError> {
    let category = Category::parse(&session.category).unwrap_or_else(|| {
        tracing::warn!(
            "session {} carries unknown category '{}', using C",
            session.id,
            session.category
        );
        Category::C
    });
    Ok(bank.load(category)?)
}
