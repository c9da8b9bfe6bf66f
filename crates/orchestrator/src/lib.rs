//! # Aula Orchestrator
//!
//! Drives one chat session against an [`AgentBackend`](aula_core::AgentBackend):
//! user turns go to the primary agent, and the latest answer can be sent on
//! to the layout agent to produce markup for the visualization pane.

pub mod render;
pub mod sanitize;
pub mod session;

pub use render::{EscapedMarkup, MarkupPolicy, RenderState, RenderView, TrustedMarkup};
pub use sanitize::clean;
pub use session::{
    Phase, RenderOutcome, Session, SessionError, SessionId, SessionSettings, TurnOutcome, View,
};
