use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use ctcae_core::collections::{grade_embedding_text, term_embedding_text};
use ctcae_core::models::record::EmbeddingRecord;
use ctcae_core::models::term::TermBlock;
use ctcae_core::service::Embedder;

use crate::error::IndexingError;
use crate::index::{CollectionInfo, CollectionMeta, VectorIndex};

const DEFAULT_EMBED_CONCURRENCY: usize = 8;

/// Names of the two collections one indexing pass writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTarget {
    pub term_collection: String,
    pub grade_collection: String,
}

impl Default for IndexTarget {
    fn default() -> Self {
        Self {
            term_collection: ctcae_core::collections::collection::TERMS.to_string(),
            grade_collection: ctcae_core::collections::collection::GRADES.to_string(),
        }
    }
}

/// Outcome of a published rebuild.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub generation: String,
    pub terms: CollectionInfo,
    pub grades: CollectionInfo,
}

/// Embeds term blocks and publishes them as a term and a grade collection.
pub struct Indexer {
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn Embedder>,
    concurrency: usize,
    building: Mutex<HashSet<String>>,
}

impl Indexer {
    pub fn new(index: Arc<dyn VectorIndex>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            index,
            embedder,
            concurrency: DEFAULT_EMBED_CONCURRENCY,
            building: Mutex::new(HashSet::new()),
        }
    }

    /// Maximum embedding calls in flight during a build.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Rebuild both collections from scratch.
    ///
    /// Every entity is validated and embedded before anything is written, so
    /// a failure leaves the published collections untouched. The grade
    /// collection is published first: once a term is visible its grades are
    /// too. A concurrent rebuild of either collection is refused.
    pub async fn build_index(
        &self,
        blocks: &[TermBlock],
        target: &IndexTarget,
    ) -> Result<BuildReport, IndexingError> {
        let _guard = BuildGuard::acquire(
            &self.building,
            [&target.term_collection, &target.grade_collection],
        )?;

        validate(blocks)?;

        let model = self.embedder.model().clone();
        let generation = Uuid::new_v4().to_string();
        info!(
            generation = %generation,
            model = %model.model_id,
            terms = blocks.len(),
            "index build started"
        );

        let term_texts: Vec<String> = blocks
            .iter()
            .map(|b| term_embedding_text(&b.term.term_name, &b.term.short_description))
            .collect();
        let grade_texts: Vec<String> = blocks
            .iter()
            .flat_map(|b| {
                b.grades.iter().map(|g| {
                    grade_embedding_text(
                        &b.term.term_name,
                        &g.grade_level.to_string(),
                        &g.grade_description,
                    )
                })
            })
            .collect();

        let term_vectors = self.embed_all(&term_texts).await?;
        let grade_vectors = self.embed_all(&grade_texts).await?;

        let term_records: Vec<EmbeddingRecord> = blocks
            .iter()
            .zip(term_vectors)
            .map(|(b, v)| EmbeddingRecord::for_term(b.term.clone(), v))
            .collect();
        let grade_records: Vec<EmbeddingRecord> = blocks
            .iter()
            .flat_map(|b| b.grades.iter().cloned())
            .zip(grade_vectors)
            .map(|(g, v)| EmbeddingRecord::for_grade(g, v))
            .collect();

        for record in term_records.iter().chain(&grade_records) {
            if record.vector.len() != model.dimension {
                return Err(IndexingError::DimensionMismatch {
                    source_id: record.source_id.clone(),
                    expected: model.dimension,
                    actual: record.vector.len(),
                });
            }
        }

        let meta = CollectionMeta {
            generation: generation.clone(),
            embedding_model: model,
            built_at: jiff::Timestamp::now(),
        };

        let grades = self
            .index
            .upsert_collection(&target.grade_collection, grade_records, meta.clone())
            .await?;
        let terms = match self
            .index
            .upsert_collection(&target.term_collection, term_records, meta)
            .await
        {
            Ok(info) => info,
            Err(e) => {
                warn!(
                    generation = %generation,
                    error = %e,
                    "term collection publish failed after grades were published"
                );
                return Err(e.into());
            }
        };

        info!(
            generation = %generation,
            terms = terms.len,
            grades = grades.len,
            "index build published"
        );

        Ok(BuildReport {
            generation,
            terms,
            grades,
        })
    }

    /// Embed texts with bounded concurrency, preserving input order.
    async fn embed_all(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, IndexingError> {
        let vectors = stream::iter(texts.iter().map(|t| self.embedder.embed(t)))
            .boxed()
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        Ok(vectors)
    }
}

/// Referential integrity and id uniqueness across the whole source.
fn validate(blocks: &[TermBlock]) -> Result<(), IndexingError> {
    if blocks.is_empty() {
        return Err(IndexingError::EmptySource);
    }

    let mut term_ids: HashMap<&str, &str> = HashMap::with_capacity(blocks.len());
    for block in blocks {
        if term_ids
            .insert(&block.term.term_id, &block.term.term_name)
            .is_some()
        {
            return Err(IndexingError::DuplicateId {
                kind: "term",
                id: block.term.term_id.clone(),
            });
        }
    }

    let mut grade_ids = HashSet::new();
    for grade in blocks.iter().flat_map(|b| &b.grades) {
        if !term_ids.contains_key(grade.term_id.as_str()) {
            return Err(IndexingError::DanglingGrade {
                grade_id: grade.grade_id.clone(),
                term_id: grade.term_id.clone(),
            });
        }
        if !grade_ids.insert(grade.grade_id.as_str()) {
            return Err(IndexingError::DuplicateId {
                kind: "grade",
                id: grade.grade_id.clone(),
            });
        }
    }

    Ok(())
}

/// Holds the collection names of a running build; released on drop.
struct BuildGuard<'a> {
    building: &'a Mutex<HashSet<String>>,
    names: Vec<String>,
}

impl<'a> BuildGuard<'a> {
    fn acquire<const N: usize>(
        building: &'a Mutex<HashSet<String>>,
        names: [&String; N],
    ) -> Result<Self, IndexingError> {
        let mut set = building.lock().map_err(|_| {
            IndexingError::Write(crate::error::SearchError::LockPoisoned)
        })?;
        if let Some(busy) = names.iter().find(|n| set.contains(n.as_str())) {
            return Err(IndexingError::RebuildInProgress((*busy).clone()));
        }
        let names: Vec<String> = names.iter().map(|n| (*n).clone()).collect();
        set.extend(names.iter().cloned());
        Ok(Self { building, names })
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut set) = self.building.lock() {
            for name in &self.names {
                set.remove(name);
            }
        }
    }
}
