use serde::Deserialize;
use thiserror::Error;

use ctcae_core::models::grade::GradeEntry;
use ctcae_core::models::matching::Confidence;
use ctcae_core::models::term::TermEntry;

use crate::candidates::CandidateSet;

/// What the completion model answered, before validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    Selected {
        term_id: String,
        grade_id: String,
        #[serde(default)]
        confidence: Option<Confidence>,
        #[serde(default)]
        rationale: String,
    },
    NoMatch {
        #[serde(default)]
        rationale: String,
    },
}

/// A decision checked against the candidate set it was made from.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidatedDecision {
    Selected {
        term: TermEntry,
        grade: GradeEntry,
        confidence: Option<Confidence>,
        rationale: String,
    },
    NoMatch {
        rationale: String,
    },
}

/// Model output that cannot be used. One occurrence triggers a retry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MalformedDecision {
    #[error("response is not a decision object ({0})")]
    NotJson(String),

    #[error("pair ({term_id}, {grade_id}) is not one of the candidates")]
    OutsideCandidateSet { term_id: String, grade_id: String },
}

/// Parse a model response. Code fences and prose around the JSON object
/// are tolerated; only the outermost `{ ... }` span is read.
pub fn parse_decision(text: &str) -> Result<Decision, MalformedDecision> {
    let start = text.find('{');
    let end = text.rfind('}');
    let json = match (start, end) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => return Err(MalformedDecision::NotJson("no JSON object found".to_string())),
    };
    serde_json::from_str(json).map_err(|e| MalformedDecision::NotJson(e.to_string()))
}

/// Set membership against the exact identifiers the model was shown.
pub fn validate(
    decision: Decision,
    candidates: &CandidateSet,
) -> Result<ValidatedDecision, MalformedDecision> {
    match decision {
        Decision::NoMatch { rationale } => Ok(ValidatedDecision::NoMatch { rationale }),
        Decision::Selected {
            term_id,
            grade_id,
            confidence,
            rationale,
        } => match candidates.lookup(&term_id, &grade_id) {
            Some((term, grade)) => Ok(ValidatedDecision::Selected {
                term: term.clone(),
                grade: grade.clone(),
                confidence,
                rationale,
            }),
            None => Err(MalformedDecision::OutsideCandidateSet { term_id, grade_id }),
        },
    }
}

/// Parse and validate in one step.
pub fn interpret(
    text: &str,
    candidates: &CandidateSet,
) -> Result<ValidatedDecision, MalformedDecision> {
    validate(parse_decision(text)?, candidates)
}
