pub mod agents;
pub mod ask;
pub mod chat;
pub mod init;
pub mod profiles;
pub mod serve;

use std::sync::Arc;

use aula_client::HttpAgentClient;
use aula_config::AppConfig;
use aula_core::{AgentBackend, AgentType};
use aula_gateway::CompletionGateway;
use aula_profiles::ProfileStore;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// The backend a session talks to: a running gateway over HTTP, or the
/// provider directly with `--direct`.
pub(crate) fn build_backend(
    config: &AppConfig,
    direct: bool,
) -> Result<Arc<dyn AgentBackend>, Box<dyn std::error::Error>> {
    if !direct {
        return Ok(Arc::new(HttpAgentClient::from_config(&config.client)?));
    }

    let gateway = CompletionGateway::from_config(config)?;
    if let Some(err) = gateway.configuration_error() {
        eprintln!();
        eprintln!("  ERROR: {err}");
        eprintln!();
        eprintln!("  Set AULA_PROVIDER_URL and AULA_API_KEY, or edit:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No usable provider for --direct mode.".into());
    }
    Ok(Arc::new(gateway))
}

/// `--agent` if given, else the current profile's agent, else `default`.
pub(crate) fn resolve_agent(
    flag: Option<&str>,
    config: &AppConfig,
) -> Result<AgentType, Box<dyn std::error::Error>> {
    if let Some(name) = flag {
        return Ok(name.parse::<AgentType>()?);
    }
    let store = ProfileStore::open(config.profiles_path());
    Ok(store
        .current()
        .map(|profile| profile.agent_type())
        .unwrap_or(AgentType::Default))
}
