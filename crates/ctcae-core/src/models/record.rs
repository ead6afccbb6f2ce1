use serde::{Deserialize, Serialize};

use super::grade::GradeEntry;
use super::term::TermEntry;

/// Whether a record was built from a term or from one of its grades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Term,
    Grade,
}

/// The entity an embedding was computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecordPayload {
    Term(TermEntry),
    Grade(GradeEntry),
}

/// One vector in a collection, with the entity it stands for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub source_id: String,
    pub source_kind: SourceKind,
    pub vector: Vec<f32>,
    pub payload: RecordPayload,
}

impl EmbeddingRecord {
    pub fn for_term(term: TermEntry, vector: Vec<f32>) -> Self {
        Self {
            source_id: term.term_id.clone(),
            source_kind: SourceKind::Term,
            vector,
            payload: RecordPayload::Term(term),
        }
    }

    pub fn for_grade(grade: GradeEntry, vector: Vec<f32>) -> Self {
        Self {
            source_id: grade.grade_id.clone(),
            source_kind: SourceKind::Grade,
            vector,
            payload: RecordPayload::Grade(grade),
        }
    }

    /// The term this record belongs to: its own id for a term record, the
    /// owning term for a grade record. Filters match against this value.
    pub fn term_id(&self) -> &str {
        match &self.payload {
            RecordPayload::Term(term) => &term.term_id,
            RecordPayload::Grade(grade) => &grade.term_id,
        }
    }

    pub fn as_term(&self) -> Option<&TermEntry> {
        match &self.payload {
            RecordPayload::Term(term) => Some(term),
            RecordPayload::Grade(_) => None,
        }
    }

    pub fn as_grade(&self) -> Option<&GradeEntry> {
        match &self.payload {
            RecordPayload::Grade(grade) => Some(grade),
            RecordPayload::Term(_) => None,
        }
    }
}
