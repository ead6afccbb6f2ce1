#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use ctcae_core::error::{ServiceError, ServiceKind};
use ctcae_core::models::grade::{GradeEntry, GradeLevel};
use ctcae_core::models::term::{TermBlock, TermEntry};
use ctcae_core::service::{BoxFuture, Embedder, EmbeddingModel};

/// Bag-of-words embedder: every distinct lowercase word gets its own axis.
/// Texts sharing no words are exactly orthogonal.
pub struct VocabEmbedder {
    model: EmbeddingModel,
    vocab: Mutex<HashMap<String, usize>>,
}

impl VocabEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model: EmbeddingModel::new("test-vocab-v1", dimension),
            vocab: Mutex::new(HashMap::new()),
        }
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vocab = self.vocab.lock().unwrap();
        let mut vector = vec![0.0; self.model.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let next = vocab.len();
            let axis = *vocab.entry(word.to_lowercase()).or_insert(next);
            vector[axis % self.model.dimension] += 1.0;
        }
        vector
    }
}

impl Embedder for VocabEmbedder {
    fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, ServiceError>> {
        Box::pin(async move { Ok(self.vector(text)) })
    }
}

/// Delegates to an inner embedder until `fail_after` calls, then reports
/// the backend as unavailable.
pub struct FlakyEmbedder<E> {
    pub inner: E,
    pub fail_after: usize,
    pub calls: AtomicUsize,
}

impl<E: Embedder> Embedder for FlakyEmbedder<E> {
    fn model(&self) -> &EmbeddingModel {
        self.inner.model()
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, ServiceError>> {
        Box::pin(async move {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call >= self.fail_after {
                return Err(ServiceError::unavailable(
                    ServiceKind::Embedding,
                    "connection refused",
                ));
            }
            self.inner.embed(text).await
        })
    }
}

fn term(name: &str, organ_system: &str, definition: &str) -> TermEntry {
    TermEntry {
        term_id: TermEntry::id_for(name),
        term_name: name.to_string(),
        organ_system: organ_system.to_string(),
        short_description: definition.to_string(),
        meddra_code: None,
        navigational_note: None,
    }
}

fn block(term: TermEntry, grades: &[(GradeLevel, &str)]) -> TermBlock {
    let grades = grades
        .iter()
        .map(|(level, description)| GradeEntry {
            grade_id: GradeEntry::id_for(&term.term_id, *level),
            term_id: term.term_id.clone(),
            grade_level: *level,
            grade_description: description.to_string(),
        })
        .collect();
    TermBlock { term, grades }
}

pub fn fixture_blocks() -> Vec<TermBlock> {
    vec![
        block(
            term(
                "Headache",
                "Nervous system disorders",
                "A disorder characterized by a sensation of marked discomfort in various parts of the head",
            ),
            &[
                (GradeLevel::One, "Mild pain"),
                (GradeLevel::Two, "Moderate pain; limiting instrumental ADL"),
                (
                    GradeLevel::Three,
                    "Severe pain; limiting self care ADL; refractory to outpatient pain medication",
                ),
            ],
        ),
        block(
            term(
                "Nausea",
                "Gastrointestinal disorders",
                "A disorder characterized by a queasy sensation and/or the urge to vomit",
            ),
            &[
                (GradeLevel::One, "Loss of appetite without alteration in eating habits"),
                (GradeLevel::Two, "Oral intake decreased without significant weight loss"),
                (
                    GradeLevel::Three,
                    "Inadequate oral caloric or fluid intake; tube feeding or hospitalization indicated",
                ),
            ],
        ),
        block(
            term(
                "Fatigue",
                "General disorders and administration site conditions",
                "A disorder characterized by a state of generalized weakness with a pronounced inability to summon sufficient energy",
            ),
            &[
                (GradeLevel::One, "Fatigue relieved by rest"),
                (GradeLevel::Two, "Fatigue not relieved by rest; limiting instrumental ADL"),
                (GradeLevel::Three, "Fatigue not relieved by rest, limiting self care ADL"),
            ],
        ),
    ]
}
