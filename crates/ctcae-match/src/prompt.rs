//! Decision prompt assembly.
//!
//! Candidates are rendered as an XML-style block so the model can cite ids
//! exactly as given.

use ctcae_core::models::matching::MatchQuery;
use ctcae_core::service::{CompletionConstraints, CompletionRequest};

use crate::candidates::CandidateSet;
use crate::config::CompletionSettings;
use crate::decision::MalformedDecision;

pub const SYSTEM_PROMPT: &str = "\
You map patient-reported symptoms onto the Common Terminology Criteria for \
Adverse Events (CTCAE). You are given a symptom description and a closed set \
of candidate terms, each with candidate grades. Choose exactly one term and \
one of that term's grades, using only ids that appear in the candidate block, \
or state that none of the candidates applies. Base the grade on the severity \
and functional impact described, not on the wording alone. Reply with a \
single JSON object and nothing else.";

const RESPONSE_FORMAT: &str = r#"Respond with exactly one JSON object in one of these forms:
{"decision": "selected", "term_id": "<term id>", "grade_id": "<grade id>", "confidence": "high" | "medium" | "low", "rationale": "<one or two sentences>"}
{"decision": "no_match", "rationale": "<why none of the candidates applies>"}"#;

/// Which attempt a prompt is for. The retry names the problem with the
/// previous answer and lists the permitted pairs verbatim.
#[derive(Debug, Clone, Copy)]
pub enum Attempt<'a> {
    First,
    Retry(&'a MalformedDecision),
}

pub fn decision_request(
    query: &MatchQuery,
    candidates: &CandidateSet,
    settings: &CompletionSettings,
    attempt: Attempt<'_>,
) -> CompletionRequest {
    let mut prompt = build_decision_prompt(query, candidates);
    if let Attempt::Retry(problem) = attempt {
        prompt.push_str("\n\n");
        prompt.push_str(&build_strict_suffix(candidates, problem));
    }

    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        prompt,
        constraints: CompletionConstraints {
            allowed_pairs: candidates.allowed_pairs(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
        },
    }
}

pub fn build_decision_prompt(query: &MatchQuery, candidates: &CandidateSet) -> String {
    let mut block = String::new();

    block.push_str(&format!("<symptom>{}</symptom>\n", escape(query.symptom_text.trim())));
    if let Some(details) = &query.details_text {
        block.push_str(&format!("<details>{}</details>\n", escape(details.trim())));
    }

    block.push_str("<candidates>\n");
    for candidate in &candidates.terms {
        let term = &candidate.term;
        block.push_str(&format!(
            "<term id=\"{}\" name=\"{}\" organ_system=\"{}\">\n",
            escape(&term.term_id),
            escape(&term.term_name),
            escape(&term.organ_system)
        ));
        if !term.short_description.is_empty() {
            block.push_str(&format!(
                "<definition>{}</definition>\n",
                escape(&term.short_description)
            ));
        }
        for grade in &candidate.grades {
            block.push_str(&format!(
                "<grade id=\"{}\" level=\"{}\">{}</grade>\n",
                escape(&grade.grade.grade_id),
                grade.grade.grade_level,
                escape(&grade.grade.grade_description)
            ));
        }
        block.push_str("</term>\n");
    }
    block.push_str("</candidates>\n\n");
    block.push_str(RESPONSE_FORMAT);
    block
}

fn build_strict_suffix(candidates: &CandidateSet, problem: &MalformedDecision) -> String {
    let mut suffix = format!(
        "Your previous answer could not be accepted: {problem}.\n\
         The only permitted (term_id, grade_id) pairs are:\n"
    );
    for (term_id, grade_id) in candidates.allowed_pairs() {
        suffix.push_str(&format!("- {term_id} / {grade_id}\n"));
    }
    suffix.push_str(
        "Use one of these pairs exactly as written, or answer no_match. \
         Output the JSON object only.",
    );
    suffix
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
