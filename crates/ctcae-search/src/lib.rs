//! ctcae-search
//!
//! Vector collections for term and grade records. Rebuilds publish by
//! swapping whole collections; queries can be scoped to a set of terms.

pub mod build;
pub mod error;
pub mod flush;
pub mod index;
pub mod query;
