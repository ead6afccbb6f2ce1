use std::fmt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("symptom text must not be empty")]
    EmptySymptom,

    #[error("invalid grade label: {0:?}")]
    InvalidGradeLabel(String),
}

/// Which backend a [`ServiceError`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Embedding,
    Completion,
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Embedding => f.write_str("embedding"),
            ServiceKind::Completion => f.write_str("completion"),
        }
    }
}

/// Failure talking to an embedding or completion backend.
///
/// Always propagated to the caller. A matcher never turns this into a
/// "no match" result.
#[derive(Debug, Clone, Error)]
pub enum ServiceError {
    #[error("{service} service unavailable: {message}")]
    Unavailable { service: ServiceKind, message: String },

    #[error("{service} service returned an unusable response: {message}")]
    InvalidResponse { service: ServiceKind, message: String },
}

impl ServiceError {
    pub fn unavailable(service: ServiceKind, message: impl Into<String>) -> Self {
        ServiceError::Unavailable {
            service,
            message: message.into(),
        }
    }

    pub fn invalid_response(service: ServiceKind, message: impl Into<String>) -> Self {
        ServiceError::InvalidResponse {
            service,
            message: message.into(),
        }
    }

    pub fn service(&self) -> ServiceKind {
        match self {
            ServiceError::Unavailable { service, .. }
            | ServiceError::InvalidResponse { service, .. } => *service,
        }
    }
}
