// src/exam/assembler.rs

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::AppError;
use crate::exam::bank::CategoryPool;
use crate::exam::config::{ExamConfig, ExamMode};
use crate::models::question::{Question, QuestionType};

/// A user's answer history across all of their sessions, deduplicated by
/// question id. Drives the `unanswered_first` / `wrong_first` modes.
#[derive(Debug, Default, Clone)]
pub struct AnswerHistory {
    pub answered: HashSet<i64>,
    pub wrong: HashSet<i64>,
}

impl AnswerHistory {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug)]
pub enum AssembleError {
    /// A type group has fewer questions than the configuration asks for.
    /// Under-filling silently is never acceptable.
    InsufficientPool {
        question_type: QuestionType,
        requested: usize,
        available: usize,
    },
}

impl fmt::Display for AssembleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssembleError::InsufficientPool {
                question_type,
                requested,
                available,
            } => write!(
                f,
                "insufficient question bank: {} pool has {} questions, {} requested",
                question_type.as_str(),
                available,
                requested
            ),
        }
    }
}

impl std::error::Error for AssembleError {}

impl From<AssembleError> for AppError {
    fn from(err: AssembleError) -> Self {
        tracing::error!("exam assembly failed: {}", err);
        AppError::InternalServerError(err.to_string())
    }
}

/// Builds the ordered question list for a new session.
///
/// Each type group is sampled uniformly without replacement at the
/// configured count, the groups are concatenated in the configuration's
/// canonical block order, and the mode is applied strictly within each
/// block so block contiguity is preserved.
pub fn assemble(
    pool: &CategoryPool,
    config: &ExamConfig,
    mode: Option<ExamMode>,
    history: &AnswerHistory,
    rng: &mut impl Rng,
) -> Result<Vec<Question>, AssembleError> {
    let mut paper = Vec::with_capacity(config.total_questions);
    for question_type in config.block_order.sequence() {
        let mut block = sample(
            pool.group(question_type),
            question_type,
            config.count_for(question_type),
            rng,
        )?;
        apply_mode(&mut block, mode, history, rng);
        paper.append(&mut block);
    }
    Ok(paper)
}

fn sample(
    group: &[Question],
    question_type: QuestionType,
    count: usize,
    rng: &mut impl Rng,
) -> Result<Vec<Question>, AssembleError> {
    if group.len() < count {
        return Err(AssembleError::InsufficientPool {
            question_type,
            requested: count,
            available: group.len(),
        });
    }
    let mut drawn = group.to_vec();
    drawn.shuffle(rng);
    drawn.truncate(count);
    Ok(drawn)
}

fn apply_mode(
    block: &mut Vec<Question>,
    mode: Option<ExamMode>,
    history: &AnswerHistory,
    rng: &mut impl Rng,
) {
    match mode {
        None => {}
        Some(ExamMode::Random) => block.shuffle(rng),
        Some(ExamMode::UnansweredFirst) => {
            partition_shuffle(block, |q| !history.answered.contains(&q.id), rng)
        }
        Some(ExamMode::WrongFirst) => {
            partition_shuffle(block, |q| history.wrong.contains(&q.id), rng)
        }
    }
}

/// Splits a block into a priority partition and the rest, shuffles each
/// independently, and rejoins with the priority partition first.
fn partition_shuffle(
    block: &mut Vec<Question>,
    priority: impl Fn(&Question) -> bool,
    rng: &mut impl Rng,
) {
    let (mut first, mut rest): (Vec<Question>, Vec<Question>) =
        block.drain(..).partition(|q| priority(q));
    first.shuffle(rng);
    rest.shuffle(rng);
    block.extend(first);
    block.extend(rest);
}

/// Corrective pass for persisted snapshots whose type blocks are no longer
/// contiguous in the expected canonical layout.
///
/// Returns the regrouped list (per-group internal order preserved) when a
/// repair is both needed and safe; `None` when the snapshot is already
/// well-formed, or when regrouping would change the question count. A
/// detected anomaly must never cost the session its data.
pub fn repair_snapshot(questions: &[Question], config: &ExamConfig) -> Option<Vec<Question>> {
    if blocks_contiguous(questions, config) {
        return None;
    }

    let mut regrouped = Vec::with_capacity(questions.len());
    for question_type in config.block_order.sequence() {
        regrouped.extend(
            questions
                .iter()
                .filter(|q| q.question_type == question_type)
                .cloned(),
        );
    }

    if regrouped.len() == config.total_questions {
        Some(regrouped)
    } else {
        None
    }
}

fn blocks_contiguous(questions: &[Question], config: &ExamConfig) -> bool {
    if questions.len() != config.total_questions {
        return false;
    }
    let mut offset = 0;
    for question_type in config.block_order.sequence() {
        let count = config.count_for(question_type);
        if questions[offset..offset + count]
            .iter()
            .any(|q| q.question_type != question_type)
        {
            return false;
        }
        offset += count;
    }
    true
}
