//! ctcae-match
//!
//! Two-stage retrieval and closed-set model decision for mapping free-text
//! symptoms onto CTCAE terms and grades.

pub mod candidates;
pub mod config;
pub mod decision;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod reindex;
pub mod request;
pub mod services;
pub mod telemetry;
