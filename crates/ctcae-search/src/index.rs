use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use tracing::info;

use ctcae_core::models::record::EmbeddingRecord;
use ctcae_core::service::{BoxFuture, EmbeddingModel};

use crate::error::SearchError;

/// Build metadata attached to a collection at publish time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionMeta {
    /// Shared by every collection written in one indexing pass.
    pub generation: String,
    pub embedding_model: EmbeddingModel,
    pub built_at: jiff::Timestamp,
}

/// What a published collection looks like from the outside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    pub name: String,
    pub generation: String,
    pub embedding_model: EmbeddingModel,
    pub built_at: jiff::Timestamp,
    pub len: usize,
}

/// Restricts a query to records owned by the listed terms.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermFilter {
    term_ids: BTreeSet<String>,
}

impl TermFilter {
    pub fn single(term_id: impl Into<String>) -> Self {
        Self {
            term_ids: BTreeSet::from([term_id.into()]),
        }
    }

    pub fn contains(&self, term_id: &str) -> bool {
        self.term_ids.contains(term_id)
    }
}

impl<S: Into<String>> FromIterator<S> for TermFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            term_ids: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// A record returned from a query with its similarity to the query vector.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    pub record: EmbeddingRecord,
    pub score: f32,
}

/// Hits from one query together with the generation of the collection they
/// were read from.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHits {
    pub generation: String,
    pub hits: Vec<ScoredRecord>,
}

/// Nearest-neighbor index service.
///
/// Implementations must publish a collection atomically: a query sees either
/// the complete previous collection or the complete new one.
pub trait VectorIndex: Send + Sync {
    /// Replace the named collection wholesale.
    fn upsert_collection<'a>(
        &'a self,
        name: &'a str,
        records: Vec<EmbeddingRecord>,
        meta: CollectionMeta,
    ) -> BoxFuture<'a, Result<CollectionInfo, SearchError>>;

    /// Up to `k` records ordered by descending similarity, all taken from a
    /// single published generation.
    fn query<'a>(
        &'a self,
        name: &'a str,
        vector: &'a [f32],
        k: usize,
        filter: Option<&'a TermFilter>,
    ) -> BoxFuture<'a, Result<QueryHits, SearchError>>;

    /// Metadata for the named collection, or `None` if it was never published.
    fn describe<'a>(&'a self, name: &'a str)
    -> BoxFuture<'a, Result<Option<CollectionInfo>, SearchError>>;
}

/// One published, immutable collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub info: CollectionInfo,
    pub records: Vec<EmbeddingRecord>,
}

impl Collection {
    /// Validate records against the declared model and assemble a collection.
    pub fn new(
        name: &str,
        records: Vec<EmbeddingRecord>,
        meta: CollectionMeta,
    ) -> Result<Self, SearchError> {
        let expected = meta.embedding_model.dimension;
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if record.vector.len() != expected {
                return Err(SearchError::DimensionMismatch {
                    collection: name.to_string(),
                    expected,
                    actual: record.vector.len(),
                });
            }
            if !seen.insert(record.source_id.as_str()) {
                return Err(SearchError::DuplicateRecord {
                    collection: name.to_string(),
                    source_id: record.source_id.clone(),
                });
            }
        }

        Ok(Self {
            info: CollectionInfo {
                name: name.to_string(),
                generation: meta.generation,
                embedding_model: meta.embedding_model,
                built_at: meta.built_at,
                len: records.len(),
            },
            records,
        })
    }

    /// Brute-force cosine search. Filtering happens before ranking, so a
    /// filtered query still returns up to `k` in-scope records.
    pub fn search(
        &self,
        vector: &[f32],
        k: usize,
        filter: Option<&TermFilter>,
    ) -> Result<Vec<ScoredRecord>, SearchError> {
        let expected = self.info.embedding_model.dimension;
        if vector.len() != expected {
            return Err(SearchError::DimensionMismatch {
                collection: self.info.name.clone(),
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &EmbeddingRecord)> = self
            .records
            .iter()
            .filter(|r| filter.is_none_or(|f| f.contains(r.term_id())))
            .map(|r| (cosine_similarity(vector, &r.vector), r))
            .collect();

        scored.sort_by(|a, b| {
            b.0.total_cmp(&a.0)
                .then_with(|| a.1.source_id.cmp(&b.1.source_id))
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(score, record)| ScoredRecord {
                record: record.clone(),
                score,
            })
            .collect())
    }
}

/// In-process [`VectorIndex`]. Each collection sits behind an `Arc`; a
/// publish swaps the `Arc` under a short write lock, so queries already
/// holding the previous generation finish against it undisturbed.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    collections: RwLock<HashMap<String, Arc<Collection>>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an index from already-validated collections (e.g. a snapshot).
    pub fn from_collections(collections: Vec<Collection>) -> Self {
        let map = collections
            .into_iter()
            .map(|c| (c.info.name.clone(), Arc::new(c)))
            .collect();
        Self {
            collections: RwLock::new(map),
        }
    }

    /// Current collection handle, if published.
    pub fn collection(&self, name: &str) -> Result<Option<Arc<Collection>>, SearchError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| SearchError::LockPoisoned)?;
        Ok(collections.get(name).cloned())
    }

    /// Handles to every published collection, sorted by name.
    pub fn collections(&self) -> Result<Vec<Arc<Collection>>, SearchError> {
        let collections = self
            .collections
            .read()
            .map_err(|_| SearchError::LockPoisoned)?;
        let mut all: Vec<_> = collections.values().cloned().collect();
        all.sort_by(|a, b| a.info.name.cmp(&b.info.name));
        Ok(all)
    }

    fn publish(&self, collection: Collection) -> Result<CollectionInfo, SearchError> {
        let info = collection.info.clone();
        let mut collections = self
            .collections
            .write()
            .map_err(|_| SearchError::LockPoisoned)?;
        collections.insert(info.name.clone(), Arc::new(collection));
        Ok(info)
    }

    fn query_now(
        &self,
        name: &str,
        vector: &[f32],
        k: usize,
        filter: Option<&TermFilter>,
    ) -> Result<QueryHits, SearchError> {
        let collection = self
            .collection(name)?
            .ok_or_else(|| SearchError::CollectionNotFound(name.to_string()))?;
        Ok(QueryHits {
            hits: collection.search(vector, k, filter)?,
            generation: collection.info.generation.clone(),
        })
    }
}

impl VectorIndex for InMemoryIndex {
    fn upsert_collection<'a>(
        &'a self,
        name: &'a str,
        records: Vec<EmbeddingRecord>,
        meta: CollectionMeta,
    ) -> BoxFuture<'a, Result<CollectionInfo, SearchError>> {
        Box::pin(async move {
            let collection = Collection::new(name, records, meta)?;
            let info = self.publish(collection)?;
            info!(
                collection = name,
                generation = %info.generation,
                count = info.len,
                "collection published"
            );
            Ok(info)
        })
    }

    fn query<'a>(
        &'a self,
        name: &'a str,
        vector: &'a [f32],
        k: usize,
        filter: Option<&'a TermFilter>,
    ) -> BoxFuture<'a, Result<QueryHits, SearchError>> {
        Box::pin(async move { self.query_now(name, vector, k, filter) })
    }

    fn describe<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<CollectionInfo>, SearchError>> {
        Box::pin(async move { Ok(self.collection(name)?.map(|c| c.info.clone())) })
    }
}

/// Cosine similarity; zero when either vector has zero norm.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}
