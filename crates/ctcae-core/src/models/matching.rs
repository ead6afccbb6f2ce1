use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::grade::GradeEntry;
use super::term::TermEntry;
use crate::error::CoreError;

/// A free-text symptom to be mapped. One per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchQuery {
    pub symptom_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details_text: Option<String>,
}

impl MatchQuery {
    /// Build a query, rejecting blank symptom text. Blank details are dropped.
    pub fn new(symptom_text: impl Into<String>, details_text: Option<String>) -> Result<Self, CoreError> {
        let symptom_text = symptom_text.into();
        if symptom_text.trim().is_empty() {
            return Err(CoreError::EmptySymptom);
        }
        let details_text = details_text.filter(|d| !d.trim().is_empty());
        Ok(Self {
            symptom_text,
            details_text,
        })
    }

    /// Text embedded for retrieval: symptom followed by details, if any.
    pub fn embedding_text(&self) -> String {
        match &self.details_text {
            Some(details) => format!("{} {}", self.symptom_text.trim(), details.trim()),
            None => self.symptom_text.trim().to_string(),
        }
    }
}

/// Model-reported confidence in a selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

/// Why a query produced no standardized mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatchReason {
    /// No term cleared the similarity floor.
    NoTermCandidates,
    /// Candidate terms were found but none had retrievable grades.
    NoGradeCandidates,
    /// The model examined the candidates and declared that none apply.
    ModelDeclined,
    /// The model named pairs outside the candidate set on both attempts.
    MalformedDecision,
}

/// Outcome of matching one query.
///
/// Built only through [`MatchResult::matched`] or [`MatchResult::no_match`],
/// so a term is never reported without a grade or vice versa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub request_id: Uuid,
    pub matched: bool,
    pub matched_term: Option<TermEntry>,
    pub matched_grade: Option<GradeEntry>,
    pub confidence: Option<Confidence>,
    pub confidence_rationale: Option<String>,
    pub no_match_reason: Option<NoMatchReason>,
    pub original_symptom: String,
    pub details: Option<String>,
    /// Index generation the candidates were retrieved from.
    pub generation: Option<String>,
}

impl MatchResult {
    pub fn matched(
        request_id: Uuid,
        query: &MatchQuery,
        term: TermEntry,
        grade: GradeEntry,
        confidence: Option<Confidence>,
        rationale: String,
    ) -> Self {
        Self {
            request_id,
            matched: true,
            matched_term: Some(term),
            matched_grade: Some(grade),
            confidence,
            confidence_rationale: Some(rationale),
            no_match_reason: None,
            original_symptom: query.symptom_text.clone(),
            details: query.details_text.clone(),
            generation: None,
        }
    }

    pub fn no_match(
        request_id: Uuid,
        query: &MatchQuery,
        reason: NoMatchReason,
        rationale: Option<String>,
    ) -> Self {
        Self {
            request_id,
            matched: false,
            matched_term: None,
            matched_grade: None,
            confidence: None,
            confidence_rationale: rationale,
            no_match_reason: Some(reason),
            original_symptom: query.symptom_text.clone(),
            details: query.details_text.clone(),
            generation: None,
        }
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }
}
