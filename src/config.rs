// src/config.rs

use dotenvy::dotenv;
use std::env;

use crate::exam::config::ExamConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    /// Directory holding the per-category question bank files.
    pub question_bank_dir: String,
    /// The exam configuration preset active for newly created sessions.
    /// Existing sessions keep the configuration frozen into their row.
    pub exam: ExamConfig,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let question_bank_dir =
            env::var("QUESTION_BANK_DIR").unwrap_or_else(|_| "data".to_string());

        let preset = env::var("EXAM_PRESET").unwrap_or_else(|_| "standard".to_string());
        let exam = ExamConfig::preset(&preset).unwrap_or_else(|| {
            tracing::warn!("unknown EXAM_PRESET '{}', using standard", preset);
            ExamConfig::standard()
        });

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            question_bank_dir,
            exam,
        }
    }
}
