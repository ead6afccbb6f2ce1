use ctcae_core::error::{ServiceError, ServiceKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BedrockError {
    #[error("model invocation failed: {0}")]
    Invocation(String),

    #[error("response parsing failed: {0}")]
    ResponseParse(String),

    #[error("response did not conform to expected schema: {0}")]
    SchemaViolation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BedrockError {
    /// Fold into the service error the matcher understands. Transport
    /// failures make the backend unavailable; anything it did answer but we
    /// could not read is an invalid response.
    pub fn into_service_error(self, service: ServiceKind) -> ServiceError {
        match self {
            BedrockError::Invocation(message) => ServiceError::unavailable(service, message),
            other => ServiceError::invalid_response(service, other.to_string()),
        }
    }
}
