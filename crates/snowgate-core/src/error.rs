// Error kinds for reconciliation
//
// Every failure is terminal for the invocation: no retries, no rollback.
// Operators re-run reconciliation to converge out of a partial state.

use thiserror::Error;

use crate::resource::ResourceKind;

/// Opaque failure from a provider call against the external system.
///
/// Providers map their transport/service errors into this; "not found" is not
/// an error for probes (it is reported as an absent [`ResourceState`]).
///
/// [`ResourceState`]: crate::resource::ResourceState
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// Coarse classification of a reconciliation failure, for callers that
/// branch on the step rather than the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Could not determine current state. Fatal, never retried locally.
    Probe,
    Create,
    /// Covers both dependent and parent deletion; aborts the remaining steps.
    Delete,
    /// Malformed input, raised pre-flight before any network call.
    Validation,
}

/// A failed reconciliation, carrying the sub-step that failed.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("probe failed for {kind} `{name}`: {source}")]
    Probe {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("create failed for {kind} `{name}`: {source}")]
    Create {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("delete failed for {kind} `{name}`: {source}")]
    Delete {
        kind: ResourceKind,
        name: String,
        #[source]
        source: ProviderError,
    },

    #[error("invalid input: {reason}")]
    Validation { reason: String },
}

impl ReconcileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReconcileError::Probe { .. } => ErrorKind::Probe,
            ReconcileError::Create { .. } => ErrorKind::Create,
            ReconcileError::Delete { .. } => ErrorKind::Delete,
            ReconcileError::Validation { .. } => ErrorKind::Validation,
        }
    }
}
