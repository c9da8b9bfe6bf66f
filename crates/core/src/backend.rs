//! The seam between the orchestrator and whatever answers completions.
//!
//! Implemented by the HTTP agent client (`aula-client`) and by the
//! completion gateway itself for in-process use (`aula-gateway`).

use async_trait::async_trait;

use crate::agent::AgentType;
use crate::completion::CompletionResult;
use crate::message::WireMessage;

#[async_trait]
pub trait AgentBackend: Send + Sync {
    /// Short name used in logs ("http", "in-process").
    fn name(&self) -> &str;

    /// Run one completion. Never panics and never returns a raw error:
    /// every failure is folded into [`CompletionResult::Failure`].
    async fn call(&self, messages: Vec<WireMessage>, agent: AgentType) -> CompletionResult;
}
