//! HTTP agent client for the Aula completion gateway.
//!
//! [`HttpAgentClient`] posts a [`CompletionRequest`] to `/api/agent` on a
//! running gateway and turns whatever comes back into a [`CompletionResult`].
//! It never returns a raw error: a failed connection or an unreadable answer
//! becomes a transport failure with status 503.

use std::time::Duration;

use async_trait::async_trait;
use aula_config::ClientConfig;
use aula_core::{
    AgentBackend, AgentType, Completion, CompletionFailure, CompletionRequest, CompletionResult,
    ErrorBody, FailureKind, WireMessage,
};
use tracing::{debug, info, warn};

/// Status reported when the gateway could not be reached or understood.
pub const TRANSPORT_FAILURE_STATUS: u16 = 503;

/// Timeout and retry policy for calls to the gateway.
///
/// The default is one attempt with no timeout. Only a failed connection is
/// retried. Once the request is sent, whatever happens next is final.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallPolicy {
    pub timeout: Option<Duration>,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self {
            timeout: None,
            max_attempts: 1,
            retry_delay: Duration::from_millis(250),
        }
    }
}

impl CallPolicy {
    pub fn from_config(config: &ClientConfig) -> Self {
        Self {
            timeout: config.timeout_secs.map(Duration::from_secs),
            max_attempts: config.max_attempts.max(1),
            ..Self::default()
        }
    }
}

pub struct HttpAgentClient {
    endpoint: String,
    policy: CallPolicy,
    client: reqwest::Client,
}

impl HttpAgentClient {
    /// Create a client for the gateway at `base_url` (e.g. `http://127.0.0.1:8787`).
    pub fn new(base_url: &str, policy: CallPolicy) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = policy.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            endpoint: format!("{}/api/agent", base_url.trim_end_matches('/')),
            policy,
            client: builder.build()?,
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, reqwest::Error> {
        Self::new(&config.gateway_url, CallPolicy::from_config(config))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn policy(&self) -> &CallPolicy {
        &self.policy
    }

    async fn call_once(&self, request: &CompletionRequest) -> Attempt {
        let response = match self.client.post(&self.endpoint).json(request).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                return Attempt::Unsent(transport_failure(format!("Failed to reach gateway: {e}")));
            }
            Err(e) => {
                return Attempt::Sent(transport_failure(format!("Gateway request failed: {e}")));
            }
        };
        Attempt::Sent(Self::read_response(response).await)
    }

    async fn read_response(response: reqwest::Response) -> CompletionResult {
        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return transport_failure(format!("Failed to read gateway response: {e}")),
        };

        if status.is_success() {
            return match serde_json::from_str::<Completion>(&body) {
                Ok(completion) => CompletionResult::Success(completion),
                Err(e) => transport_failure(format!("Undecodable gateway response: {e}")),
            };
        }

        warn!(status = status.as_u16(), body = %body, "Gateway returned error");
        let error_body = serde_json::from_str::<ErrorBody>(&body).unwrap_or_else(|_| ErrorBody {
            error: format!("Gateway returned error status: {}", status.as_u16()),
            details: (!body.is_empty()).then(|| body.clone()),
            kind: None,
        });
        CompletionResult::Failure(CompletionFailure::from_body(status.as_u16(), error_body))
    }
}

fn transport_failure(details: String) -> CompletionResult {
    CompletionResult::Failure(CompletionFailure {
        kind: FailureKind::Transport,
        error: "An error occurred while processing your request".into(),
        details: Some(details),
        status_code: TRANSPORT_FAILURE_STATUS,
    })
}

/// One POST to the gateway. Only a request that never got a connection is
/// sent again; anything else may already have reached the provider.
enum Attempt {
    Sent(CompletionResult),
    Unsent(CompletionResult),
}

#[async_trait]
impl AgentBackend for HttpAgentClient {
    fn name(&self) -> &str {
        "http"
    }

    async fn call(&self, messages: Vec<WireMessage>, agent: AgentType) -> CompletionResult {
        let request = CompletionRequest {
            messages,
            agent_type: agent,
        };
        info!(agent = %agent, endpoint = %self.endpoint, "Calling gateway");

        let mut attempt = 1;
        loop {
            match self.call_once(&request).await {
                Attempt::Sent(result) => return result,
                Attempt::Unsent(result) if attempt >= self.policy.max_attempts => return result,
                Attempt::Unsent(_) => {}
            }
            debug!(attempt, max_attempts = self.policy.max_attempts, "Retrying after connect failure");
            tokio::time::sleep(self.policy.retry_delay).await;
            attempt += 1;
        }
    }
}
