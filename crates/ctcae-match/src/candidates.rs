//! Candidate selection between retrieval stages, and the closed set the
//! decision step may choose from.

use ctcae_core::models::grade::GradeEntry;
use ctcae_core::models::term::TermEntry;
use ctcae_search::index::ScoredRecord;
use ctcae_search::query::rank;

/// Thresholds applied to term-stage scores.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionPolicy {
    pub min_similarity: f32,
    pub near_tie_margin: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TermCandidate {
    pub term: TermEntry,
    pub score: f32,
}

/// Pick the term(s) whose grades are worth retrieving.
///
/// Term records below `min_similarity` are discarded. The best survivor is
/// always kept; the runner-up joins it only when the gap between them is
/// strictly less than `near_tie_margin`. Non-term records are ignored.
pub fn select_terms(hits: &[ScoredRecord], policy: &SelectionPolicy) -> Vec<TermCandidate> {
    let mut eligible: Vec<ScoredRecord> = hits
        .iter()
        .filter(|hit| hit.record.as_term().is_some() && hit.score >= policy.min_similarity)
        .cloned()
        .collect();
    rank(&mut eligible);

    let mut selected: Vec<TermCandidate> = Vec::with_capacity(2);
    let mut eligible = eligible.into_iter().filter_map(|hit| {
        let score = hit.score;
        hit.record.as_term().cloned().map(|term| TermCandidate { term, score })
    });

    let Some(best) = eligible.next() else {
        return selected;
    };
    let runner_up = eligible.next();
    let best_score = best.score;
    selected.push(best);

    if let Some(second) = runner_up {
        if best_score - second.score < policy.near_tie_margin {
            selected.push(second);
        }
    }
    selected
}

#[derive(Debug, Clone, PartialEq)]
pub struct GradeCandidate {
    pub grade: GradeEntry,
    pub score: f32,
}

/// A candidate term with the grades retrieved for it.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateTerm {
    pub term: TermEntry,
    pub score: f32,
    pub grades: Vec<GradeCandidate>,
}

/// Everything the decision step is allowed to name, in term-rank order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub terms: Vec<CandidateTerm>,
}

impl CandidateSet {
    /// Pair each selected term with its grade hits. Terms without grades are
    /// dropped, and a grade hit owned by another term is never attached.
    pub fn assemble(terms: Vec<TermCandidate>, grade_hits: Vec<Vec<ScoredRecord>>) -> Self {
        let terms = terms
            .into_iter()
            .zip(grade_hits)
            .filter_map(|(candidate, hits)| {
                let grades: Vec<GradeCandidate> = hits
                    .into_iter()
                    .filter_map(|hit| {
                        let score = hit.score;
                        hit.record
                            .as_grade()
                            .filter(|g| g.term_id == candidate.term.term_id)
                            .cloned()
                            .map(|grade| GradeCandidate { grade, score })
                    })
                    .collect();
                (!grades.is_empty()).then_some(CandidateTerm {
                    term: candidate.term,
                    score: candidate.score,
                    grades,
                })
            })
            .collect();
        Self { terms }
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Every `(term_id, grade_id)` pair a decision may name.
    pub fn allowed_pairs(&self) -> Vec<(String, String)> {
        self.terms
            .iter()
            .flat_map(|t| {
                t.grades
                    .iter()
                    .map(move |g| (t.term.term_id.clone(), g.grade.grade_id.clone()))
            })
            .collect()
    }

    /// The term and grade behind a pair, if the pair is in the set.
    pub fn lookup(&self, term_id: &str, grade_id: &str) -> Option<(&TermEntry, &GradeEntry)> {
        let term = self.terms.iter().find(|t| t.term.term_id == term_id)?;
        let grade = term.grades.iter().find(|g| g.grade.grade_id == grade_id)?;
        Some((&term.term, &grade.grade))
    }
}
