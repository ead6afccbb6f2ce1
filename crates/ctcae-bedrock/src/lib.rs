//! ctcae-bedrock
//!
//! Bedrock-backed embedding and completion services.

pub mod client;
pub mod converse;
pub mod embed;
pub mod error;
pub mod tokens;
