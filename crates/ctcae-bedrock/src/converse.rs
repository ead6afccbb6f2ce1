use aws_sdk_bedrockruntime::Client;
use aws_sdk_bedrockruntime::types::{
    ContentBlock, ConversationRole, InferenceConfiguration, Message, SystemContentBlock,
};
use tracing::info;
use uuid::Uuid;

use ctcae_core::error::{ServiceError, ServiceKind};
use ctcae_core::service::{BoxFuture, Completer, CompletionRequest};

use crate::error::BedrockError;
use crate::tokens::{self, TokenCount};

/// Chat model served through the Converse API.
pub struct ConverseCompleter {
    client: Client,
    model_id: String,
}

impl ConverseCompleter {
    pub fn new(client: Client, model_id: impl Into<String>) -> Self {
        Self {
            client,
            model_id: model_id.into(),
        }
    }

    async fn invoke(&self, request: &CompletionRequest) -> Result<String, BedrockError> {
        let invocation_id = Uuid::new_v4();
        info!(
            invocation_id = %invocation_id,
            model = %self.model_id,
            allowed_pairs = request.constraints.allowed_pairs.len(),
            "starting decision completion"
        );

        let inference = InferenceConfiguration::builder()
            .max_tokens(i32::try_from(request.constraints.max_tokens).unwrap_or(i32::MAX))
            .temperature(request.constraints.temperature)
            .build();

        let response = self
            .client
            .converse()
            .model_id(&self.model_id)
            .system(SystemContentBlock::Text(request.system.clone()))
            .messages(
                Message::builder()
                    .role(ConversationRole::User)
                    .content(ContentBlock::Text(request.prompt.clone()))
                    .build()
                    .map_err(|e| BedrockError::Invocation(e.to_string()))?,
            )
            .inference_config(inference)
            .send()
            .await
            .map_err(|e| BedrockError::Invocation(e.into_service_error().to_string()))?;

        let output_message = response
            .output()
            .and_then(|o| o.as_message().ok())
            .ok_or_else(|| BedrockError::ResponseParse("no message in response".to_string()))?;

        let response_text = output_message
            .content()
            .iter()
            .filter_map(|block| {
                if let ContentBlock::Text(text) = block {
                    Some(text.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>()
            .join("");

        let usage = response
            .usage()
            .map(tokens::extract_token_usage)
            .unwrap_or_default();
        log_usage(invocation_id, &self.model_id, usage);

        Ok(response_text)
    }
}

fn log_usage(invocation_id: Uuid, model_id: &str, usage: TokenCount) {
    let cost_usd = tokens::get_pricing(model_id)
        .map(|p| p.estimate_cost(usage))
        .unwrap_or(0.0);
    info!(
        invocation_id = %invocation_id,
        input_tokens = usage.input,
        output_tokens = usage.output,
        cost_usd,
        "decision completion finished"
    );
}

impl Completer for ConverseCompleter {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn complete<'a>(
        &'a self,
        request: &'a CompletionRequest,
    ) -> BoxFuture<'a, Result<String, ServiceError>> {
        Box::pin(async move {
            self.invoke(request)
                .await
                .map_err(|e| e.into_service_error(ServiceKind::Completion))
        })
    }
}
