//! Error types for the Aula domain.
//!
//! Uses `thiserror` for ergonomic error definitions. `GatewayError` is the
//! taxonomy every completion failure is classified into before it leaves the
//! gateway; `ProviderError` is what a provider backend reports.

use thiserror::Error;

use crate::completion::{CompletionFailure, FailureKind};

/// The top-level error type for a completion request.
///
/// Every variant maps to exactly one HTTP status and one
/// [`CompletionFailure`] via [`GatewayError::into_failure`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    /// Missing provider endpoint or credential. Detected before any call.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unknown agent type, empty history, malformed body.
    #[error("Invalid request: {0}")]
    ClientInput(String),

    /// The provider answered with a non-success status.
    #[error("Provider returned error status: {status}")]
    Upstream { status: u16, body: String },

    /// Network or decoding failure.
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Result type alias using [`GatewayError`].
pub type Result<T> = std::result::Result<T, GatewayError>;

impl GatewayError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Configuration(_) => FailureKind::Configuration,
            Self::ClientInput(_) => FailureKind::ClientInput,
            Self::Upstream { .. } => FailureKind::Upstream,
            Self::Transport(_) => FailureKind::Transport,
        }
    }

    /// HTTP status reported to the caller. Upstream statuses pass through unchanged.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Configuration(_) | Self::Transport(_) => 500,
            Self::ClientInput(_) => 400,
            Self::Upstream { status, .. } => *status,
        }
    }

    /// Convert into the uniform failure shape returned to callers.
    pub fn into_failure(self) -> CompletionFailure {
        let kind = self.kind();
        let status_code = self.status_code();
        let (error, details) = match self {
            Self::Configuration(message) | Self::ClientInput(message) => (message, None),
            Self::Upstream { status, body } => (
                format!("Provider returned error status: {status}"),
                Some(body),
            ),
            Self::Transport(message) => (
                "An error occurred while processing your request".to_string(),
                Some(message),
            ),
        };
        CompletionFailure {
            kind,
            error,
            details,
            status_code,
        }
    }
}

/// Errors reported by a completion provider backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("API request failed (status: {status_code})")]
    ApiError { status_code: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode provider response: {0}")]
    Decode(String),
}

impl From<ProviderError> for GatewayError {
    fn from(err: ProviderError) -> Self {
        match err {
            ProviderError::ApiError { status_code, body } => Self::Upstream {
                status: status_code,
                body,
            },
            ProviderError::Network(reason) | ProviderError::Decode(reason) => {
                Self::Transport(reason)
            }
        }
    }
}
