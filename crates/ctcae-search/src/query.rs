use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::SearchError;
use crate::index::{CollectionInfo, QueryHits, ScoredRecord, TermFilter, VectorIndex};

/// Upper bound on `k` for a single retrieval call.
pub const MAX_K: usize = 20;

/// Read-only front of a [`VectorIndex`] used at match time.
///
/// The index is pluggable, so the retriever re-applies the term filter and
/// the ranking order to whatever the engine returns.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(index: Arc<dyn VectorIndex>) -> Self {
        Self { index }
    }

    pub async fn describe(&self, collection: &str) -> Result<Option<CollectionInfo>, SearchError> {
        self.index.describe(collection).await
    }

    /// The `k` nearest records in `collection`, best first.
    ///
    /// Returns an empty vector when the collection is empty. With a filter,
    /// only records owned by the listed terms are returned.
    pub async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&TermFilter>,
    ) -> Result<Vec<ScoredRecord>, SearchError> {
        Ok(self
            .search_with_generation(collection, vector, k, filter)
            .await?
            .hits)
    }

    /// Like [`Retriever::search`], also reporting which generation answered.
    pub async fn search_with_generation(
        &self,
        collection: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&TermFilter>,
    ) -> Result<QueryHits, SearchError> {
        if k == 0 || k > MAX_K {
            return Err(SearchError::InvalidK { k, max: MAX_K });
        }

        let QueryHits {
            generation,
            mut hits,
        } = self.index.query(collection, vector, k, filter).await?;

        if let Some(filter) = filter {
            let before = hits.len();
            hits.retain(|hit| filter.contains(hit.record.term_id()));
            if hits.len() != before {
                warn!(
                    collection,
                    dropped = before - hits.len(),
                    "index returned records outside the term filter"
                );
            }
        }

        rank(&mut hits);
        hits.truncate(k);

        debug!(
            collection,
            k,
            generation = %generation,
            hits = hits.len(),
            filtered = filter.is_some(),
            "search complete"
        );
        Ok(QueryHits { generation, hits })
    }
}

/// Descending score, ties broken by ascending source id.
pub fn rank(hits: &mut [ScoredRecord]) {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.record.source_id.cmp(&b.record.source_id))
    });
}
