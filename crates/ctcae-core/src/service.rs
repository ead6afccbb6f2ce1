//! Service seams for the two model backends.
//!
//! Both traits return boxed futures so they can be held as trait objects
//! (`Arc<dyn Embedder>`) without pulling in a macro crate.

use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::ServiceError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Identity of an embedding model. Recorded alongside every collection so a
/// query-time model can be checked against the one used at indexing time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub model_id: String,
    pub dimension: usize,
}

impl EmbeddingModel {
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
        }
    }
}

/// Text-embedding backend.
pub trait Embedder: Send + Sync {
    /// The pinned model this embedder produces vectors with.
    fn model(&self) -> &EmbeddingModel;

    /// Embed a single text into a vector of `model().dimension` floats.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, ServiceError>>;
}

/// Constraints handed to the completion backend alongside the prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConstraints {
    /// The only `(term_id, grade_id)` pairs an answer may name.
    pub allowed_pairs: Vec<(String, String)>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A single closed-set decision request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub constraints: CompletionConstraints,
}

/// Text-completion backend.
pub trait Completer: Send + Sync {
    fn model_id(&self) -> &str;

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>>;
}
