//! `aula serve` — Start the completion gateway HTTP server.

pub async fn run(port_override: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config()?;

    if let Some(port) = port_override {
        config.gateway.port = port;
    }

    println!("📚 Aula Gateway");
    println!("   Listening: {}:{}", config.gateway.host, config.gateway.port);
    println!("   Provider:  {} ({})", config.provider.name, config.provider.model);
    println!("   Origins:   {}", config.gateway.allowed_origins.join(", "));

    aula_gateway::start(config).await?;

    Ok(())
}
