#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ctcae_core::error::{ServiceError, ServiceKind};
use ctcae_core::service::{
    BoxFuture, Completer, CompletionRequest, Embedder, EmbeddingModel,
};
use ctcae_match::config::MatcherConfig;
use ctcae_match::engine::MatchEngine;
use ctcae_match::reindex::{SourceFormat, reindex_from_csv};
use ctcae_match::services;
use ctcae_search::build::{BuildReport, Indexer};
use ctcae_search::index::InMemoryIndex;

pub const DIMENSION: usize = 512;

pub const LONG_TABLE: &str = "\
Section,Term,Grade,Description,Definition
Nervous system disorders,,,,
,Headache,Grade 1,Mild pain,A disorder characterized by a sensation of marked discomfort in various parts of the head
,,Grade 2,Moderate pain; limiting instrumental ADL,
,,Grade 3,Severe pain; limiting self care ADL; refractory to outpatient pain medication,
Gastrointestinal disorders,,,,
,Nausea,Grade 1,Loss of appetite without alteration in eating habits,A disorder characterized by a queasy sensation and/or the urge to vomit
,,Grade 2,Oral intake decreased without significant weight loss,
,,Grade 3,Inadequate oral caloric or fluid intake; tube feeding or hospitalization indicated,
General disorders and administration site conditions,,,,
,Fatigue,Grade 1,Fatigue relieved by rest,A disorder characterized by a state of generalized weakness with a pronounced inability to summon sufficient energy
,,Grade 2,Fatigue not relieved by rest; limiting instrumental ADL,
,,Grade 3,\"Fatigue not relieved by rest, limiting self care ADL\",
";

/// Bag-of-words embedder: every distinct lowercase word gets its own axis.
pub struct VocabEmbedder {
    model: EmbeddingModel,
    vocab: Mutex<HashMap<String, usize>>,
    pub calls: AtomicUsize,
}

impl VocabEmbedder {
    pub fn new() -> Self {
        Self::with_model(EmbeddingModel::new("test-vocab-v1", DIMENSION))
    }

    pub fn with_model(model: EmbeddingModel) -> Self {
        Self {
            model,
            vocab: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
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
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.vector(text))
        })
    }
}

/// Reports the indexed model but every embedding call fails.
pub struct FailingEmbedder {
    model: EmbeddingModel,
    pub calls: AtomicUsize,
}

impl FailingEmbedder {
    pub fn new() -> Self {
        Self {
            model: EmbeddingModel::new("test-vocab-v1", DIMENSION),
            calls: AtomicUsize::new(0),
        }
    }
}

impl Embedder for FailingEmbedder {
    fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    fn embed<'a>(&'a self, _text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, ServiceError>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ServiceError::unavailable(
                ServiceKind::Embedding,
                "ServiceUnavailableException",
            ))
        })
    }
}

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedCompleter {
    script: Mutex<VecDeque<Result<String, ServiceError>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
    pub delay: Option<Duration>,
}

impl ScriptedCompleter {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            script: Mutex::new(responses.into_iter().map(|s| Ok(s.into())).collect()),
            ..Self::default()
        }
    }

    pub fn failing(error: ServiceError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompt(&self, i: usize) -> String {
        self.requests.lock().unwrap()[i].prompt.clone()
    }
}

impl Completer for ScriptedCompleter {
    fn model_id(&self) -> &str {
        "scripted"
    }

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        Box::pin(async move {
            self.requests.lock().unwrap().push(request.clone());
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| {
                Err(ServiceError::invalid_response(
                    ServiceKind::Completion,
                    "script exhausted",
                ))
            })
        })
    }
}

pub fn selected(term_id: &str, grade_id: &str) -> String {
    format!(
        r#"{{"decision":"selected","term_id":"{term_id}","grade_id":"{grade_id}","confidence":"high","rationale":"Severity and functional impact fit this grade."}}"#
    )
}

pub fn test_config() -> MatcherConfig {
    MatcherConfig {
        min_similarity: 0.05,
        request_timeout_secs: 5,
        ..MatcherConfig::default()
    }
}

pub fn write_csv(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

pub struct Harness {
    pub index: Arc<InMemoryIndex>,
    pub embedder: Arc<VocabEmbedder>,
    pub indexer: Indexer,
    pub report: BuildReport,
    pub dir: tempfile::TempDir,
}

impl Harness {
    /// Index [`LONG_TABLE`] into a fresh in-memory index.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let csv = write_csv(dir.path(), "ctcae.csv", LONG_TABLE);
        let index = Arc::new(InMemoryIndex::new());
        let embedder = Arc::new(VocabEmbedder::new());
        let indexer = services::indexer(&test_config(), index.clone(), embedder.clone());
        let report = reindex_from_csv(
            &csv,
            SourceFormat::Long,
            &indexer,
            &test_config().index_target(),
        )
        .await
        .unwrap();

        Self {
            index,
            embedder,
            indexer,
            report,
            dir,
        }
    }

    pub async fn engine(&self, completer: Arc<ScriptedCompleter>) -> MatchEngine {
        MatchEngine::new(
            self.embedder.clone(),
            completer,
            self.index.clone(),
            test_config(),
        )
        .await
        .unwrap()
    }
}
