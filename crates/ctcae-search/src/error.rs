use ctcae_core::error::ServiceError;
use thiserror::Error;

/// Errors from the vector index service and the retriever in front of it.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    #[error("k must be between 1 and {max}, got {k}")]
    InvalidK { k: usize, max: usize },

    #[error("collection {collection}: expected {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch {
        collection: String,
        expected: usize,
        actual: usize,
    },

    #[error("collection {collection}: duplicate record {source_id}")]
    DuplicateRecord {
        collection: String,
        source_id: String,
    },

    #[error("index lock poisoned")]
    LockPoisoned,

    #[error("snapshot corrupted: {0}")]
    SnapshotCorrupted(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A rebuild that could not be published. The previous collections keep
/// serving.
#[derive(Debug, Error)]
pub enum IndexingError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] ServiceError),

    #[error("grade {grade_id} references unknown term {term_id}")]
    DanglingGrade { grade_id: String, term_id: String },

    #[error("duplicate {kind} id: {id}")]
    DuplicateId { kind: &'static str, id: String },

    #[error("reference source contains no terms")]
    EmptySource,

    #[error("embedding for {source_id} has {actual} dimensions, model declares {expected}")]
    DimensionMismatch {
        source_id: String,
        expected: usize,
        actual: usize,
    },

    #[error("a rebuild of collection {0} is already running")]
    RebuildInProgress(String),

    #[error("index write failed: {0}")]
    Write(#[from] SearchError),
}
