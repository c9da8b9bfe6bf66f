//! # Aula Core
//!
//! Domain types, traits, and error definitions for the Aula educational chat
//! pipeline. This crate has **no framework dependencies**: it defines the
//! model the gateway, client and orchestrator crates implement against.
//!
//! - [`AgentType`] and [`PromptRegistry`] decide which persona answers.
//! - [`Provider`] abstracts the chat-completion backend.
//! - [`AgentBackend`] is what the orchestrator calls to get a completion.
//! - [`GatewayError`] is the single failure taxonomy; every failure ends up
//!   as a [`CompletionResult::Failure`].

pub mod agent;
pub mod backend;
pub mod completion;
pub mod error;
pub mod message;
pub mod prompt;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use agent::AgentType;
pub use backend::AgentBackend;
pub use completion::{
    Completion, CompletionFailure, CompletionRequest, CompletionResult, ErrorBody, FailureKind,
};
pub use error::{GatewayError, ProviderError, Result};
pub use message::{ChatMessage, Role, WireMessage};
pub use prompt::PromptRegistry;
pub use provider::{Provider, ProviderRequest, ProviderResponse, Usage};
