//! Completion request/result types shared by the gateway, the client and the
//! orchestrator.

use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::message::WireMessage;

/// What a caller sends to the gateway.
///
/// The caller never supplies the system message; the gateway synthesizes it
/// from the prompt registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub messages: Vec<WireMessage>,
    pub agent_type: AgentType,
}

/// A successful completion. Both fields carry the same raw text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Completion {
    pub message: String,
    pub html_content: String,
}

impl Completion {
    pub fn from_text(text: impl Into<String>) -> Self {
        let message = text.into();
        Self {
            html_content: message.clone(),
            message,
        }
    }
}

/// Classification of a failed completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Configuration,
    ClientInput,
    Upstream,
    Transport,
}

/// A failed completion, whichever layer it failed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionFailure {
    pub kind: FailureKind,
    pub error: String,
    pub details: Option<String>,
    pub status_code: u16,
}

impl CompletionFailure {
    /// The JSON body sent alongside `status_code`.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.error.clone(),
            details: self.details.clone(),
            kind: Some(self.kind),
        }
    }

    /// Rebuild a failure from an HTTP status and error body.
    ///
    /// Bodies without a `kind` are classified from the status: 400 is a
    /// client-input error, anything else came from upstream.
    pub fn from_body(status_code: u16, body: ErrorBody) -> Self {
        let kind = body.kind.unwrap_or(if status_code == 400 {
            FailureKind::ClientInput
        } else {
            FailureKind::Upstream
        });
        Self {
            kind,
            error: body.error,
            details: body.details,
            status_code,
        }
    }
}

impl std::fmt::Display for CompletionFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (status: {})", self.error, self.status_code)?;
        if let Some(details) = &self.details {
            write!(f, ": {details}")?;
        }
        Ok(())
    }
}

/// Wire shape of a failure: `{ error, details?, kind? }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FailureKind>,
}

/// Exactly one of success or failure, never a hybrid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionResult {
    Success(Completion),
    Failure(CompletionFailure),
}

impl CompletionResult {
    pub fn success(text: impl Into<String>) -> Self {
        Self::Success(Completion::from_text(text))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<Completion, CompletionFailure> {
        match self {
            Self::Success(completion) => Ok(completion),
            Self::Failure(failure) => Err(failure),
        }
    }
}

impl From<crate::error::GatewayError> for CompletionResult {
    fn from(err: crate::error::GatewayError) -> Self {
        Self::Failure(err.into_failure())
    }
}
