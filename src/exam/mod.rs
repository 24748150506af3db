// src/exam/mod.rs
//
// The exam session and scoring engine: question bank store, session
// assembler, scoring, persistence and result projections.

pub mod assembler;
pub mod bank;
pub mod config;
pub mod report;
pub mod scoring;
pub mod store;
