//! Error taxonomy for lead operations.
//!
//! Every failure that reaches the presentation layer is a `LeadError`, which
//! renders to a stable `{kind, message}` pair via [`ErrorReport`].
use crate::lead::{LeadId, LeadStatus};
use serde::{Deserialize, Serialize};

/// Domain errors surfaced by the store, dispatchers, and service.
#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("{0}")]
    Validation(String),

    #[error("lead {0} not found")]
    NotFound(LeadId),

    #[error("lead {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: LeadId,
        from: LeadStatus,
        to: LeadStatus,
    },

    #[error("call for lead {id} failed: {source}")]
    Dispatch {
        id: LeadId,
        #[source]
        source: crate::provider::ProviderError,
    },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("no operator session (run `leadcall login`)")]
    Unauthorized,
}

impl LeadError {
    /// Stable machine-readable kind used in JSON output.
    pub fn kind(&self) -> &'static str {
        match self {
            LeadError::Validation(_) => "validation",
            LeadError::NotFound(_) => "not_found",
            LeadError::InvalidTransition { .. } => "invalid_transition",
            LeadError::Dispatch { .. } => "dispatch",
            LeadError::Storage(_) => "storage",
            LeadError::Config(_) => "config",
            LeadError::Unauthorized => "unauthorized",
        }
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            kind: self.kind().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<anyhow::Error> for LeadError {
    fn from(err: anyhow::Error) -> Self {
        let message = err
            .chain()
            .map(|cause| cause.to_string())
            .collect::<Vec<_>>()
            .join(": ");
        LeadError::Storage(message)
    }
}

/// Structured error pair exposed to callers instead of raw error chains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub kind: String,
    pub message: String,
}

pub type LeadResult<T> = Result<T, LeadError>;
