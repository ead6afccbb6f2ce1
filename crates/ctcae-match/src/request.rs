use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ctcae_core::error::CoreError;
use ctcae_core::models::matching::{Confidence, MatchQuery, MatchResult, NoMatchReason};

/// Inbound request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymptomRequest {
    pub symptom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl SymptomRequest {
    pub fn into_query(self) -> Result<MatchQuery, CoreError> {
        MatchQuery::new(self.symptom, self.details)
    }
}

/// Outbound response body. A no-match is a normal response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymptomResponse {
    pub request_id: Uuid,
    pub matched: bool,
    pub matched_term: Option<String>,
    pub matched_term_id: Option<String>,
    pub organ_system: Option<String>,
    pub matched_grade: Option<String>,
    pub matched_grade_id: Option<String>,
    pub grade_description: Option<String>,
    pub confidence: Option<Confidence>,
    pub confidence_rationale: Option<String>,
    pub no_match_reason: Option<NoMatchReason>,
    pub original_symptom: String,
    pub details: Option<String>,
    pub generation: Option<String>,
}

impl From<MatchResult> for SymptomResponse {
    fn from(result: MatchResult) -> Self {
        let (matched_term, matched_term_id, organ_system) = match result.matched_term {
            Some(term) => (
                Some(term.term_name),
                Some(term.term_id),
                Some(term.organ_system),
            ),
            None => (None, None, None),
        };
        let (matched_grade, matched_grade_id, grade_description) = match result.matched_grade {
            Some(grade) => (
                Some(grade.grade_level.to_string()),
                Some(grade.grade_id),
                Some(grade.grade_description),
            ),
            None => (None, None, None),
        };

        Self {
            request_id: result.request_id,
            matched: result.matched,
            matched_term,
            matched_term_id,
            organ_system,
            matched_grade,
            matched_grade_id,
            grade_description,
            confidence: result.confidence,
            confidence_rationale: result.confidence_rationale,
            no_match_reason: result.no_match_reason,
            original_symptom: result.original_symptom,
            details: result.details,
            generation: result.generation,
        }
    }
}
