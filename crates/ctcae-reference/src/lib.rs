//! ctcae-reference
//!
//! CTCAE reference table parsing. Pure transform from the tabular source to
//! terms and their grades; no index or model dependency. The caller decides
//! where the result is persisted (see [`catalog`]).

pub mod catalog;
pub mod error;
pub mod extract;
pub mod table;
pub mod wide;
