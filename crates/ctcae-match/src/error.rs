use std::fmt;

use ctcae_core::error::{CoreError, ServiceError};
use ctcae_core::service::EmbeddingModel;
use ctcae_reference::error::{CatalogError, ExtractionError};
use ctcae_search::error::{IndexingError, SearchError};
use thiserror::Error;

/// Stage of a match request, reported when the request deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchPhase {
    EmbedQuery,
    RetrieveTerms,
    RetrieveGrades,
    Decide,
}

impl fmt::Display for MatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchPhase::EmbedQuery => f.write_str("embed_query"),
            MatchPhase::RetrieveTerms => f.write_str("retrieve_terms"),
            MatchPhase::RetrieveGrades => f.write_str("retrieve_grades"),
            MatchPhase::Decide => f.write_str("decide"),
        }
    }
}

/// Per-request failure. A "no match" outcome is never an error.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("service unavailable: {0}")]
    ServiceUnavailable(#[from] ServiceError),

    #[error("request timed out during {phase}")]
    Timeout { phase: MatchPhase },

    #[error("invalid query: {0}")]
    InvalidQuery(#[from] CoreError),

    #[error("retrieval failed: {0}")]
    Search(#[from] SearchError),
}

/// Conditions that stop an engine from being constructed.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(
        "collection {collection} was indexed with {} ({} dims) but the runtime embedder is {} ({} dims)",
        .indexed.model_id, .indexed.dimension, .runtime.model_id, .runtime.dimension
    )]
    ConfigMismatch {
        collection: String,
        indexed: EmbeddingModel,
        runtime: EmbeddingModel,
    },

    #[error("collection {0} has not been indexed")]
    MissingCollection(String),

    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("index unavailable: {0}")]
    Search(#[from] SearchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory found")]
    NoConfigDir,

    #[error(
        "config_version {found} is newer than this build supports ({supported})"
    )]
    UnsupportedVersion { found: u32, supported: u32 },

    #[error("config is not a JSON object")]
    NotAnObject,

    #[error("{field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("environment variable {var} has an unusable value {value:?}")]
    InvalidOverride { var: &'static str, value: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A reference refresh that did not publish.
#[derive(Debug, Error)]
pub enum ReindexError {
    #[error("reference extraction failed: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("indexing failed: {0}")]
    Indexing(#[from] IndexingError),

    #[error("snapshot write failed: {0}")]
    Snapshot(#[from] SearchError),

    #[error("catalog write failed: {0}")]
    Catalog(#[from] CatalogError),
}
