use aws_sdk_bedrockruntime::Client;
use aws_smithy_types::Blob;
use serde::{Deserialize, Serialize};
use tracing::debug;

use ctcae_core::error::{ServiceError, ServiceKind};
use ctcae_core::service::{BoxFuture, Embedder, EmbeddingModel};

use crate::error::BedrockError;
use crate::tokens::{self, TokenCount};

/// Request body for Titan text embeddings v2.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitanEmbedRequest<'a> {
    pub input_text: &'a str,
    pub dimensions: usize,
    pub normalize: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TitanEmbedResponse {
    embedding: Vec<f32>,
    #[serde(default)]
    input_text_token_count: Option<u64>,
}

/// A decoded embedding and the tokens billed for it.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingResponse {
    pub vector: Vec<f32>,
    pub usage: TokenCount,
}

impl EmbeddingResponse {
    /// Estimated USD cost for this call, zero for models without pricing.
    pub fn cost_usd(&self, model_id: &str) -> f64 {
        tokens::get_pricing(model_id)
            .map(|p| p.estimate_cost(self.usage))
            .unwrap_or(0.0)
    }
}

/// Titan embedding model served through `InvokeModel`.
pub struct TitanEmbedder {
    client: Client,
    model: EmbeddingModel,
}

impl TitanEmbedder {
    pub fn new(client: Client, model: EmbeddingModel) -> Self {
        Self { client, model }
    }

    async fn invoke(&self, text: &str) -> Result<Vec<f32>, BedrockError> {
        let body = serde_json::to_vec(&TitanEmbedRequest {
            input_text: text,
            dimensions: self.model.dimension,
            normalize: true,
        })?;

        let response = self
            .client
            .invoke_model()
            .model_id(&self.model.model_id)
            .content_type("application/json")
            .accept("application/json")
            .body(Blob::new(body))
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let parsed = parse_embedding_response(response.body().as_ref(), self.model.dimension)?;
        debug!(
            model = %self.model.model_id,
            input_tokens = parsed.usage.input,
            cost_usd = parsed.cost_usd(&self.model.model_id),
            "embedding finished"
        );
        Ok(parsed.vector)
    }
}

impl Embedder for TitanEmbedder {
    fn model(&self) -> &EmbeddingModel {
        &self.model
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, ServiceError>> {
        Box::pin(async move {
            self.invoke(text)
                .await
                .map_err(|e| e.into_service_error(ServiceKind::Embedding))
        })
    }
}

/// Decode an `InvokeModel` body and check the vector length against the
/// model's declared dimension.
pub fn parse_embedding_response(
    body: &[u8],
    dimension: usize,
) -> Result<EmbeddingResponse, BedrockError> {
    let parsed: TitanEmbedResponse = serde_json::from_slice(body)
        .map_err(|e| BedrockError::ResponseParse(format!("embedding response: {e}")))?;

    if parsed.embedding.len() != dimension {
        return Err(BedrockError::SchemaViolation(format!(
            "expected {dimension}-dimensional embedding, got {}",
            parsed.embedding.len()
        )));
    }

    Ok(EmbeddingResponse {
        vector: parsed.embedding,
        usage: TokenCount {
            input: parsed.input_text_token_count.unwrap_or(0),
            output: 0,
        },
    })
}
