// src/exam/report.rs
//
// Read-only projections over stored sessions and answers. No I/O here;
// handlers fetch rows and pools, these functions shape them.

use chrono::{DateTime, Utc};

use crate::exam::bank::CategoryPool;
use crate::models::question::QuestionType;
use crate::models::session::{
    AnswerDetail, ExamAnswer, ExamResultsResponse, ExamSession, HistoryEntry, HistorySessionRow,
    SessionStats, SessionSummary, TypeStats, TypeStatsBreakdown,
};

fn duration_seconds(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> i64 {
    end.map(|e| (e - start).num_seconds().max(0)).unwrap_or(0)
}

/// One history line. Pass/fail is judged against the threshold stored with
/// the session's own configuration, not the currently active default.
pub fn history_entry(row: &HistorySessionRow) -> HistoryEntry {
    let score = row.score.unwrap_or(0.0);
    HistoryEntry {
        id: row.id,
        start_time: row.start_time,
        end_time: row.end_time,
        duration: duration_seconds(row.start_time, row.end_time),
        score,
        total_questions: row.total_questions,
        passed: score >= row.config.passing_score,
        wrong_answers_count: row.wrong_count,
    }
}

/// Full per-session results: answers joined back against the category pool
/// for prompts/options, overall stats, and a per-type breakdown.
pub fn build_results(
    session: &ExamSession,
    answers: &[ExamAnswer],
    pool: &CategoryPool,
) -> ExamResultsResponse {
    let mut details: Vec<AnswerDetail> = answers
        .iter()
        .map(|answer| answer_detail(answer, pool))
        .collect();
    details.sort_by_key(|d| d.question_id);

    let total_score = session.score.unwrap_or(0.0);
    let correct = answers.iter().filter(|a| a.is_correct).count();

    ExamResultsResponse {
        exam_session: SessionSummary {
            id: session.id,
            start_time: session.start_time,
            end_time: session.end_time,
            is_completed: session.is_completed,
            time_limit: session.time_limit,
        },
        stats: SessionStats {
            total_questions: session.total_questions,
            answered_questions: answers.len(),
            correct_answers: correct,
            wrong_answers: answers.len() - correct,
            total_score,
            passed: total_score >= session.config.passing_score,
            duration: duration_seconds(session.start_time, session.end_time),
        },
        type_stats: type_stats(answers),
        answer_details: details,
    }
}

fn answer_detail(answer: &ExamAnswer, pool: &CategoryPool) -> AnswerDetail {
    let question = pool.find(answer.question_id);
    AnswerDetail {
        question_id: answer.question_id,
        question: question
            .map(|q| q.question.clone())
            .unwrap_or_else(|| "题目未找到".to_string()),
        question_type: answer.question_type.clone(),
        options: question.and_then(|q| q.options.clone()),
        user_answer: answer.user_answer.0.clone(),
        correct_answer: answer.correct_answer.0.clone(),
        is_correct: answer.is_correct,
        score: answer.score,
        answered_at: answer.answered_at,
    }
}

fn type_stats(answers: &[ExamAnswer]) -> TypeStatsBreakdown {
    let mut breakdown = TypeStatsBreakdown::default();
    for answer in answers {
        let bucket = match QuestionType::parse(&answer.question_type) {
            Some(QuestionType::Single) => &mut breakdown.single,
            Some(QuestionType::Multiple) => &mut breakdown.multiple,
            Some(QuestionType::Judge) => &mut breakdown.judge,
            None => continue,
        };
        bucket.total += 1;
        if answer.is_correct {
            bucket.correct += 1;
        }
        bucket.score += answer.score;
    }
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::config::ExamConfig;
    use crate::models::question::{AnswerValue, Question};
    use sqlx::types::Json;
    use uuid::Uuid;

    fn answer(question_id: i64, question_type: &str, is_correct: bool, score: f64) -> ExamAnswer {
        ExamAnswer {
            session_id: Uuid::nil(),
            question_id,
            question_type: question_type.to_string(),
            user_answer: Json(AnswerValue::Choice("A".to_string())),
            correct_answer: Json(AnswerValue::Choice("A".to_string())),
            is_correct,
            score,
            answered_at: Utc::now(),
        }
    }

    fn pool() -> CategoryPool {
        CategoryPool {
            single: vec![Question {
                id: 1,
                question: "单选一".to_string(),
                question_type: QuestionType::Single,
                options: Some(std::collections::BTreeMap::from([
                    ("A".to_string(), "a".to_string()),
                    ("B".to_string(), "b".to_string()),
                ])),
                correct_answer: AnswerValue::Choice("A".to_string()),
            }],
            multiple: vec![],
            judge: vec![],
        }
    }

    fn session(score: Option<f64>, end_time: Option<DateTime<Utc>>) -> ExamSession {
        let start = Utc::now() - chrono::Duration::seconds(120);
        ExamSession {
            id: Uuid::new_v4(),
            user_id: 1,
            category: "C".to_string(),
            start_time: start,
            end_time,
            questions: Json(vec![]),
            config: Json(ExamConfig::standard()),
            total_questions: 100,
            time_limit: 5400,
            is_completed: end_time.is_some(),
            score,
        }
    }

    #[test]
    fn history_duration_zero_without_end_time() {
        let row = HistorySessionRow {
            id: Uuid::new_v4(),
            start_time: Utc::now(),
            end_time: None,
            score: Some(42.0),
            total_questions: 100,
            config: Json(ExamConfig::standard()),
            wrong_count: 3,
        };
        let entry = history_entry(&row);
        assert_eq!(entry.duration, 0);
        assert!(!entry.passed);
        assert_eq!(entry.wrong_answers_count, 3);
    }

    #[test]
    fn history_passed_uses_session_threshold() {
        let mut config = ExamConfig::standard();
        config.passing_score = 40.0;
        let row = HistorySessionRow {
            id: Uuid::new_v4(),
            start_time: Utc::now() - chrono::Duration::seconds(300),
            end_time: Some(Utc::now()),
            score: Some(42.0),
            total_questions: 100,
            config: Json(config),
            wrong_count: 0,
        };
        let entry = history_entry(&row);
        assert!(entry.passed);
        assert_eq!(entry.duration, 300);
    }

    #[test]
    fn results_join_recovers_prompt_and_flags_missing_questions() {
        let session = session(Some(1.0), Some(Utc::now()));
        let answers = vec![answer(99, "single", false, 0.0), answer(1, "single", true, 1.0)];
        let results = build_results(&session, &answers, &pool());

        // sorted by question id
        assert_eq!(results.answer_details[0].question_id, 1);
        assert_eq!(results.answer_details[0].question, "单选一");
        assert!(results.answer_details[0].options.is_some());
        assert_eq!(results.answer_details[1].question, "题目未找到");
        assert!(results.answer_details[1].options.is_none());
    }

    #[test]
    fn type_stats_split_counts_and_scores() {
        let answers = vec![
            answer(1, "single", true, 1.0),
            answer(2, "single", false, 0.0),
            answer(3, "multiple", false, 0.5),
            answer(4, "judge", true, 1.0),
            answer(5, "essay", true, 1.0), // unknown type: ignored
        ];
        let stats = type_stats(&answers);
        assert_eq!(stats.single, TypeStats { total: 2, correct: 1, score: 1.0 });
        assert_eq!(stats.multiple, TypeStats { total: 1, correct: 0, score: 0.5 });
        assert_eq!(stats.judge, TypeStats { total: 1, correct: 1, score: 1.0 });
    }

    #[test]
    fn stats_aggregate_answers() {
        let session = session(Some(2.0), Some(Utc::now()));
        let answers = vec![
            answer(1, "single", true, 1.0),
            answer(2, "judge", true, 1.0),
            answer(3, "multiple", false, 0.0),
        ];
        let results = build_results(&session, &answers, &pool());
        assert_eq!(results.stats.answered_questions, 3);
        assert_eq!(results.stats.correct_answers, 2);
        assert_eq!(results.stats.wrong_answers, 1);
        assert_eq!(results.stats.total_score, 2.0);
        assert!(!results.stats.passed);
    }
}
