//! ctcae-core
//!
//! Pure domain types, collection naming, and the service seams (embedding and
//! completion) shared by every other crate. No provider SDK dependency.

pub mod collections;
pub mod error;
pub mod models;
pub mod service;
