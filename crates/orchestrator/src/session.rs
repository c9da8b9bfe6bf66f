//! One chat session: history, the in-flight guards, and the render pane.
//!
//! Every state change happens under a short `std::sync::Mutex` critical
//! section. The lock is released before any backend call, so a second
//! submission observes the pending flag instead of blocking on the lock.
//! At most one backend call is in flight per session: a primary turn and a
//! layout call never overlap.

use std::sync::{Arc, Mutex, MutexGuard};

use aula_config::{LayoutTrigger, SessionConfig};
use aula_core::{AgentBackend, AgentType, ChatMessage, CompletionFailure, CompletionResult, Role, WireMessage};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::render::{MarkupPolicy, RenderState, RenderView, TrustedMarkup};
use crate::sanitize::clean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Which pane the user is looking at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Chat,
    Visualization,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    AwaitingPrimary,
    AwaitingLayout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The primary agent answered; the answer is now the last turn.
    Answered(String),
    /// The primary agent failed; `reply` is the apology appended instead.
    Apologized {
        reply: String,
        failure: CompletionFailure,
    },
}

impl TurnOutcome {
    pub fn reply(&self) -> &str {
        match self {
            TurnOutcome::Answered(reply) | TurnOutcome::Apologized { reply, .. } => reply,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    Rendered(String),
    /// The latest answer is the one already on screen.
    Unchanged,
    /// There is no assistant turn yet.
    NothingToRender,
    Failed(CompletionFailure),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A request is already in flight for this session")]
    Busy,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub primary_agent: AgentType,
    pub layout_trigger: LayoutTrigger,
    pub apology_message: String,
}

impl SessionSettings {
    pub fn from_config(config: &SessionConfig, primary_agent: AgentType) -> Self {
        Self {
            primary_agent,
            layout_trigger: config.layout_trigger,
            apology_message: config.apology_message.clone(),
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from_config(&SessionConfig::default(), AgentType::Default)
    }
}

#[derive(Debug, Default)]
struct SessionState {
    history: Vec<ChatMessage>,
    view: View,
    render: RenderState,
    primary_pending: bool,
    layout_pending: bool,
    /// The latest assistant turn is the apology for a failed call.
    apologized: bool,
}

/// Who asked for a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    User,
    Automatic,
}

impl SessionState {
    fn busy(&self) -> bool {
        self.primary_pending || self.layout_pending
    }

    fn last_assistant(&self) -> Option<&str> {
        self.history
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Pick the turn to lay out and mark the layout call as pending.
    ///
    /// `Err` carries the outcome when no call is needed.
    fn begin_render(&mut self, trigger: Trigger) -> Result<String, RenderOutcome> {
        if trigger == Trigger::Automatic && self.apologized {
            return Err(RenderOutcome::NothingToRender);
        }
        let Some(latest) = self.last_assistant().map(str::to_owned) else {
            return Err(RenderOutcome::NothingToRender);
        };
        if self.render.last_rendered.as_deref() == Some(latest.as_str()) {
            return Err(RenderOutcome::Unchanged);
        }
        self.layout_pending = true;
        self.render.view = RenderView::Loading;
        Ok(latest)
    }
}

pub struct Session {
    id: SessionId,
    backend: Arc<dyn AgentBackend>,
    settings: SessionSettings,
    markup: Box<dyn MarkupPolicy>,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(backend: Arc<dyn AgentBackend>, settings: SessionSettings) -> Self {
        Self {
            id: SessionId::new(),
            backend,
            settings,
            markup: Box::new(TrustedMarkup),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Replace the policy applied to cleaned layout output.
    pub fn with_markup_policy(mut self, policy: impl MarkupPolicy + 'static) -> Self {
        self.markup = Box::new(policy);
        self
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn history(&self) -> Vec<ChatMessage> {
        self.lock().history.clone()
    }

    pub fn view(&self) -> View {
        self.lock().view
    }

    pub fn render_view(&self) -> RenderView {
        self.lock().render.view.clone()
    }

    pub fn last_rendered(&self) -> Option<String> {
        self.lock().render.last_rendered.clone()
    }

    pub fn phase(&self) -> Phase {
        let state = self.lock();
        if state.primary_pending {
            Phase::AwaitingPrimary
        } else if state.layout_pending {
            Phase::AwaitingLayout
        } else {
            Phase::Idle
        }
    }

    /// Send one user turn to the primary agent.
    ///
    /// Exactly one assistant turn is appended per accepted submission: the
    /// answer, or the apology if the call failed.
    pub async fn submit(&self, input: &str) -> Result<TurnOutcome, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let messages: Vec<WireMessage> = {
            let mut state = self.lock();
            if state.busy() {
                warn!(session = %self.id, "Rejected submission while a call is in flight");
                return Err(SessionError::Busy);
            }
            state.primary_pending = true;
            state.history.push(ChatMessage::user(input));
            state.history.iter().map(ChatMessage::to_wire).collect()
        };

        info!(
            session = %self.id,
            agent = %self.settings.primary_agent,
            backend = self.backend.name(),
            turns = messages.len(),
            "Submitting turn"
        );
        let result = self.backend.call(messages, self.settings.primary_agent).await;

        // The layout call is claimed before the lock drops, so nothing can
        // start in between and the new answer is the one rendered.
        let (outcome, candidate) = {
            let mut state = self.lock();
            state.primary_pending = false;
            let outcome = match result {
                CompletionResult::Success(completion) => {
                    state.history.push(ChatMessage::assistant(completion.message.clone()));
                    state.apologized = false;
                    TurnOutcome::Answered(completion.message)
                }
                CompletionResult::Failure(failure) => {
                    warn!(session = %self.id, error = %failure, "Primary agent failed");
                    let reply = self.settings.apology_message.clone();
                    state.history.push(ChatMessage::assistant(reply.clone()));
                    state.apologized = true;
                    TurnOutcome::Apologized { reply, failure }
                }
            };
            let candidate = if self.auto_render(state.view) {
                state.begin_render(Trigger::Automatic).ok()
            } else {
                None
            };
            (outcome, candidate)
        };

        if let Some(candidate) = candidate {
            let rendered = self.run_layout(candidate).await;
            debug!(session = %self.id, outcome = ?rendered, "Automatic render finished");
        }

        Ok(outcome)
    }

    fn auto_render(&self, view: View) -> bool {
        self.settings.layout_trigger == LayoutTrigger::OnViewActivate && view == View::Visualization
    }

    /// Run the layout agent over the latest assistant turn.
    ///
    /// Skipped when that turn is what is already on screen.
    pub async fn request_render(&self) -> Result<RenderOutcome, SessionError> {
        self.render(Trigger::User).await
    }

    async fn render(&self, trigger: Trigger) -> Result<RenderOutcome, SessionError> {
        let candidate = {
            let mut state = self.lock();
            if state.busy() {
                return Err(SessionError::Busy);
            }
            match state.begin_render(trigger) {
                Ok(candidate) => candidate,
                Err(outcome) => {
                    debug!(session = %self.id, ?outcome, "No layout call needed");
                    return Ok(outcome);
                }
            }
        };
        Ok(self.run_layout(candidate).await)
    }

    /// Call the layout agent for `candidate`; the layout call must already be
    /// marked pending.
    async fn run_layout(&self, candidate: String) -> RenderOutcome {
        info!(session = %self.id, chars = candidate.len(), "Requesting layout");
        let result = self
            .backend
            .call(vec![WireMessage::user(candidate.clone())], AgentType::Layout)
            .await;

        let mut state = self.lock();
        state.layout_pending = false;
        match result {
            CompletionResult::Success(completion) => {
                let markup = self.markup.admit(clean(&completion.message));
                state.render.view = RenderView::Markup(markup.clone());
                state.render.last_rendered = Some(candidate);
                RenderOutcome::Rendered(markup)
            }
            CompletionResult::Failure(failure) => {
                warn!(session = %self.id, error = %failure, "Layout agent failed");
                state.render.view = RenderView::Failed(failure.clone());
                RenderOutcome::Failed(failure)
            }
        }
    }

    /// Switch panes. With the `on_view_activate` trigger, entering the
    /// visualization pane renders the latest answer. An apology is never
    /// rendered this way; `request_render` still lays it out on request.
    pub async fn activate_view(&self, view: View) -> Result<Option<RenderOutcome>, SessionError> {
        self.lock().view = view;
        if self.auto_render(view) {
            return self.render(Trigger::Automatic).await.map(Some);
        }
        Ok(None)
    }
}
