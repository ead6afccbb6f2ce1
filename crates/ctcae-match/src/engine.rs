use std::future::Future;
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::time::Instant;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

use ctcae_core::models::matching::{MatchQuery, MatchResult, NoMatchReason};
use ctcae_core::service::{Completer, Embedder};
use ctcae_search::index::{QueryHits, TermFilter, VectorIndex};
use ctcae_search::query::Retriever;

use crate::candidates::{CandidateSet, select_terms};
use crate::config::MatcherConfig;
use crate::decision::{ValidatedDecision, interpret};
use crate::error::{MatchError, MatchPhase, StartupError};
use crate::prompt::{Attempt, decision_request};
use crate::request::{SymptomRequest, SymptomResponse};

/// Maps one symptom at a time onto a (term, grade) pair.
///
/// Holds no per-request state, so a single engine serves concurrent calls.
pub struct MatchEngine {
    embedder: Arc<dyn Embedder>,
    completer: Arc<dyn Completer>,
    retriever: Retriever,
    config: MatcherConfig,
}

impl MatchEngine {
    /// Validate the configuration and check that both collections exist and
    /// were indexed with the same embedding model the engine will query with.
    pub async fn new(
        embedder: Arc<dyn Embedder>,
        completer: Arc<dyn Completer>,
        index: Arc<dyn VectorIndex>,
        config: MatcherConfig,
    ) -> Result<Self, StartupError> {
        config.validate()?;
        let retriever = Retriever::new(index);
        let runtime = embedder.model().clone();

        for collection in [&config.term_collection, &config.grade_collection] {
            let info = retriever
                .describe(collection)
                .await?
                .ok_or_else(|| StartupError::MissingCollection(collection.clone()))?;
            if info.embedding_model != runtime {
                return Err(StartupError::ConfigMismatch {
                    collection: collection.clone(),
                    indexed: info.embedding_model,
                    runtime,
                });
            }
            info!(
                collection = %collection,
                generation = %info.generation,
                count = info.len,
                "collection ready"
            );
        }

        info!(
            embedding_model = %runtime.model_id,
            completion_model = completer.model_id(),
            "match engine started"
        );
        Ok(Self {
            embedder,
            completer,
            retriever,
            config,
        })
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Boundary entry point: validate the request, match, flatten the result.
    pub async fn handle(&self, request: SymptomRequest) -> Result<SymptomResponse, MatchError> {
        let query = request.into_query()?;
        let result = self.match_query(&query).await?;
        Ok(SymptomResponse::from(result))
    }

    /// Run one query through embed, term retrieval, grade retrieval and the
    /// model decision. Service failures and the request deadline surface as
    /// errors; every other dead end is a `matched = false` result.
    pub async fn match_query(&self, query: &MatchQuery) -> Result<MatchResult, MatchError> {
        let request_id = Uuid::new_v4();
        let deadline = Instant::now() + self.config.request_timeout();
        let span = info_span!("match", request_id = %request_id);

        async move {
            let result = self.run(request_id, query, deadline).await;
            match &result {
                Ok(r) => info!(
                    matched = r.matched,
                    term = r.matched_term.as_ref().map(|t| t.term_id.as_str()),
                    grade = r.matched_grade.as_ref().map(|g| g.grade_id.as_str()),
                    no_match_reason = ?r.no_match_reason,
                    "match complete"
                ),
                Err(e) => warn!(error = %e, "match failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        request_id: Uuid,
        query: &MatchQuery,
        deadline: Instant,
    ) -> Result<MatchResult, MatchError> {
        let text = query.embedding_text();
        let vector = within(deadline, MatchPhase::EmbedQuery, self.embedder.embed(&text)).await?;
        debug!(dimension = vector.len(), "query embedded");

        // Term stage.
        let QueryHits {
            generation,
            hits: term_hits,
        } = within(
            deadline,
            MatchPhase::RetrieveTerms,
            self.retriever.search_with_generation(
                &self.config.term_collection,
                &vector,
                self.config.top_n_terms,
                None,
            ),
        )
        .await?;

        let finish = |result: MatchResult| result.with_generation(generation.clone());

        let terms = select_terms(&term_hits, &self.config.selection_policy());
        debug!(
            hits = term_hits.len(),
            best = term_hits.first().map(|h| h.score),
            selected = ?terms.iter().map(|t| t.term.term_id.as_str()).collect::<Vec<_>>(),
            "term candidates"
        );
        if terms.is_empty() {
            return Ok(finish(MatchResult::no_match(
                request_id,
                query,
                NoMatchReason::NoTermCandidates,
                None,
            )));
        }

        // Grade stage: one scoped query per selected term, merged in term-rank order.
        let filters: Vec<TermFilter> = terms
            .iter()
            .map(|t| TermFilter::single(t.term.term_id.clone()))
            .collect();
        let grade_hits = within(
            deadline,
            MatchPhase::RetrieveGrades,
            try_join_all(filters.iter().map(|filter| {
                self.retriever.search_with_generation(
                    &self.config.grade_collection,
                    &vector,
                    self.config.top_n_grades,
                    Some(filter),
                )
            })),
        )
        .await?;

        // A rebuild may publish between the two stages.
        if let Some(other) = grade_hits.iter().find(|g| g.generation != generation) {
            warn!(
                term_generation = %generation,
                grade_generation = %other.generation,
                "grade stage read a different index generation"
            );
        }
        let grade_hits = grade_hits.into_iter().map(|g| g.hits).collect();

        let candidates = CandidateSet::assemble(terms, grade_hits);
        debug!(pairs = ?candidates.allowed_pairs(), "grade candidates");
        if candidates.is_empty() {
            return Ok(finish(MatchResult::no_match(
                request_id,
                query,
                NoMatchReason::NoGradeCandidates,
                None,
            )));
        }

        // Decision stage: one attempt, one stricter retry.
        let first = self.decide(query, &candidates, Attempt::First, deadline).await?;
        let decision = match interpret(&first, &candidates) {
            Ok(decision) => decision,
            Err(problem) => {
                warn!(problem = %problem, "malformed decision, retrying");
                let second = self
                    .decide(query, &candidates, Attempt::Retry(&problem), deadline)
                    .await?;
                match interpret(&second, &candidates) {
                    Ok(decision) => decision,
                    Err(problem) => {
                        warn!(problem = %problem, "malformed decision after retry");
                        return Ok(finish(MatchResult::no_match(
                            request_id,
                            query,
                            NoMatchReason::MalformedDecision,
                            Some(problem.to_string()),
                        )));
                    }
                }
            }
        };

        let result = match decision {
            ValidatedDecision::Selected {
                term,
                grade,
                confidence,
                rationale,
            } => MatchResult::matched(request_id, query, term, grade, confidence, rationale),
            ValidatedDecision::NoMatch { rationale } => MatchResult::no_match(
                request_id,
                query,
                NoMatchReason::ModelDeclined,
                Some(rationale),
            ),
        };
        Ok(finish(result))
    }

    async fn decide(
        &self,
        query: &MatchQuery,
        candidates: &CandidateSet,
        attempt: Attempt<'_>,
        deadline: Instant,
    ) -> Result<String, MatchError> {
        let request = decision_request(query, candidates, &self.config.completion, attempt);
        debug!(retry = matches!(attempt, Attempt::Retry(_)), "requesting decision");
        within(deadline, MatchPhase::Decide, self.completer.complete(&request)).await
    }
}

/// Await `fut` unless the request deadline passes first.
async fn within<T, E, F>(deadline: Instant, phase: MatchPhase, fut: F) -> Result<T, MatchError>
where
    F: Future<Output = Result<T, E>>,
    MatchError: From<E>,
{
    match tokio::time::timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(MatchError::from),
        Err(_) => Err(MatchError::Timeout { phase }),
    }
}
