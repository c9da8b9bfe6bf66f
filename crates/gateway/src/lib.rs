//! Completion gateway and HTTP endpoint for Aula.
//!
//! Exposes:
//! - `POST /api/agent`: one completion for `{ messages, agentType }`
//! - `GET /api/agents`: the agent types the gateway accepts
//! - `GET /health`
//!
//! Built on Axum. Every failure leaves as `{ error, details?, kind }` with
//! the status chosen by [`aula_core::GatewayError::status_code`].

pub mod completion;

pub use completion::CompletionGateway;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use aula_config::{AppConfig, GatewayConfig};
use aula_core::{AgentType, Completion, CompletionResult, ErrorBody, FailureKind, WireMessage};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub type SharedGateway = Arc<CompletionGateway>;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS restricted to `gateway.allowed_origins`
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(gateway: SharedGateway, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/agents", get(agents_handler))
        .route("/api/agent", post(agent_handler))
        .with_state(gateway)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors_layer(&config.allowed_origins))
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Start the gateway HTTP server on `gateway.host:gateway.port`.
pub async fn start(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let gateway = Arc::new(CompletionGateway::from_config(&config)?);

    if let Some(err) = gateway.configuration_error() {
        warn!(error = %err, "Serving without a usable provider; completions will fail with 500");
    }

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve(listener, gateway, config.gateway).await?;
    Ok(())
}

/// Serve the gateway on an already bound listener.
pub async fn serve(
    listener: tokio::net::TcpListener,
    gateway: SharedGateway,
    config: GatewayConfig,
) -> std::io::Result<()> {
    let app = build_router(gateway, &config);
    info!(addr = %listener.local_addr()?, "Gateway listening");
    axum::serve(listener, app).await
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct AgentsResponse {
    agents: Vec<&'static str>,
}

async fn agents_handler() -> Json<AgentsResponse> {
    Json(AgentsResponse {
        agents: AgentType::ALL.iter().map(AgentType::as_str).collect(),
    })
}

/// Request body for `POST /api/agent`. `agentType` stays a string here so an
/// unknown value is reported by the gateway, after the history check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AgentRequest {
    #[serde(default)]
    messages: Vec<WireMessage>,
    agent_type: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

async fn agent_handler(
    State(gateway): State<SharedGateway>,
    body: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<Completion>, ApiError> {
    let Json(request) = body.map_err(rejection_response)?;

    info!(
        agent_type = %request.agent_type,
        messages = request.messages.len(),
        "Completion request"
    );

    match gateway
        .complete_named(request.messages, &request.agent_type)
        .await
    {
        CompletionResult::Success(completion) => Ok(Json(completion)),
        CompletionResult::Failure(failure) => {
            let status =
                StatusCode::from_u16(failure.status_code).unwrap_or(StatusCode::BAD_GATEWAY);
            Err((status, Json(failure.to_body())))
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> ApiError {
    let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        StatusCode::PAYLOAD_TOO_LARGE
    } else {
        StatusCode::BAD_REQUEST
    };
    warn!(status = status.as_u16(), reason = %rejection.body_text(), "Malformed completion request");
    (
        status,
        Json(ErrorBody {
            error: "Invalid request body".into(),
            details: Some(rejection.body_text()),
            kind: Some(FailureKind::ClientInput),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use aula_core::{PromptRegistry, Provider, ProviderError, ProviderRequest, ProviderResponse};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    struct MockProvider {
        reply: Result<String, ProviderError>,
        calls: Mutex<u32>,
    }

    impl MockProvider {
        fn new(reply: Result<String, ProviderError>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                calls: Mutex::new(0),
            })
        }
    }

    #[async_trait]
    impl Provider for MockProvider {
        fn name(&self) -> &str {
            "gateway_mock"
        }

        async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            *self.calls.lock().unwrap() += 1;
            self.reply.clone().map(|content| ProviderResponse {
                content,
                model: "mock-model".into(),
                usage: None,
            })
        }
    }

    fn app_with(provider: Arc<MockProvider>) -> Router {
        let gateway = CompletionGateway::new(PromptRegistry::builtin(), provider, "mock-model");
        build_router(Arc::new(gateway), &GatewayConfig::default())
    }

    fn post_agent(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/agent")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = app_with(MockProvider::new(Ok(String::new())));
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn agents_endpoint_lists_every_agent() {
        let app = app_with(MockProvider::new(Ok(String::new())));
        let req = Request::builder().uri("/api/agents").body(Body::empty()).unwrap();

        let json = json_body(app.oneshot(req).await.unwrap()).await;
        let agents: Vec<&str> = json["agents"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(agents, ["junior", "middle", "senior", "default", "andrea", "layout"]);
    }

    #[tokio::test]
    async fn successful_completion_returns_both_fields() {
        let app = app_with(MockProvider::new(Ok("Plants make food from light".into())));

        let response = app
            .oneshot(post_agent(
                r#"{"messages":[{"role":"user","content":"What is photosynthesis?"}],"agentType":"junior"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["message"], "Plants make food from light");
        assert_eq!(json["htmlContent"], "Plants make food from light");
    }

    #[tokio::test]
    async fn unknown_agent_type_is_400_without_provider_call() {
        let provider = MockProvider::new(Ok("unused".into()));
        let app = app_with(provider.clone());

        let response = app
            .oneshot(post_agent(
                r#"{"messages":[{"role":"user","content":"Hi"}],"agentType":"wizard"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "No system prompt found for agentType: wizard");
        assert_eq!(json["kind"], "client_input");
        assert_eq!(*provider.calls.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn malformed_body_is_400() {
        let app = app_with(MockProvider::new(Ok("unused".into())));
        let response = app.oneshot(post_agent("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"], "Invalid request body");
    }

    #[tokio::test]
    async fn missing_messages_is_400() {
        let app = app_with(MockProvider::new(Ok("unused".into())));
        let response = app.oneshot(post_agent(r#"{"agentType":"junior"}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn upstream_429_is_propagated() {
        let app = app_with(MockProvider::new(Err(ProviderError::ApiError {
            status_code: 429,
            body: "{\"error\":\"rate_limited\"}".into(),
        })));

        let response = app
            .oneshot(post_agent(
                r#"{"messages":[{"role":"user","content":"Hi"}],"agentType":"senior"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let json = json_body(response).await;
        assert_eq!(json["details"], "{\"error\":\"rate_limited\"}");
        assert_eq!(json["kind"], "upstream");
    }

    #[tokio::test]
    async fn missing_configuration_is_500() {
        let gateway = CompletionGateway::unconfigured(
            PromptRegistry::builtin(),
            aula_core::GatewayError::Configuration("Provider API key not configured".into()),
        );
        let app = build_router(Arc::new(gateway), &GatewayConfig::default());

        let response = app
            .oneshot(post_agent(
                r#"{"messages":[{"role":"user","content":"Hi"}],"agentType":"middle"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = json_body(response).await;
        assert_eq!(json["kind"], "configuration");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let app = app_with(MockProvider::new(Ok(String::new())));
        let req = Request::builder()
            .uri("/health")
            .header("origin", "http://localhost:3000")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "http://localhost:3000"
        );
    }
}
