use ctcae_core::models::grade::GradeLevel;
use thiserror::Error;

/// Malformed reference data. Fatal to the indexing run; never retried.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("line {line}: invalid grade label {label:?} for term {term:?}")]
    InvalidGradeLabel {
        line: usize,
        term: String,
        label: String,
    },

    #[error("term {term:?} (line {line}) has no applicable grades")]
    NoGrades { line: usize, term: String },

    #[error("line {line}: grade {level} of term {term:?} has no description and none to inherit")]
    MissingDescription {
        line: usize,
        term: String,
        level: GradeLevel,
    },

    #[error("line {line}: term {term:?} lists grade {level} more than once")]
    DuplicateGrade {
        line: usize,
        term: String,
        level: GradeLevel,
    },

    #[error("line {line}: term {term:?} (id {term_id:?}) was already defined by an earlier block")]
    DuplicateTerm {
        line: usize,
        term: String,
        term_id: String,
    },

    #[error("line {line}: term name {term:?} yields an empty identifier")]
    InvalidTermName { line: usize, term: String },

    #[error("line {line}: grade row has no term to attach to")]
    OrphanRow { line: usize },

    #[error("line {line}: term {term:?} appears before any organ-system section")]
    MissingSection { line: usize, term: String },

    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog at {0} contains no terms")]
    Empty(String),
}
