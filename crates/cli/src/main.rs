//! Aula CLI — the main entry point.
//!
//! Commands:
//! - `init`     — Write a starter config
//! - `serve`    — Start the completion gateway HTTP server
//! - `chat`     — Interactive chat with layout rendering
//! - `ask`      — Send a single message
//! - `agents`   — List agent types
//! - `profiles` — Manage learner profiles

use aula_config::LayoutTrigger;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "aula",
    about = "Aula — educational chat assistant with layout rendering",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Create ~/.aula and a starter config.toml
    Init,

    /// Start the completion gateway HTTP server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Chat interactively
    Chat {
        /// Agent type (defaults to the current profile's, then "default")
        #[arg(short, long, env = "AULA_AGENT")]
        agent: Option<String>,

        /// Call the provider in-process instead of a running gateway
        #[arg(long)]
        direct: bool,

        /// When to run the layout agent: manual or on-view-activate
        #[arg(long, value_parser = parse_layout_trigger)]
        layout_trigger: Option<LayoutTrigger>,
    },

    /// Send a single message and print the answer
    Ask {
        /// The message to send
        #[arg(short, long)]
        message: String,

        /// Agent type (defaults to the current profile's, then "default")
        #[arg(short, long, env = "AULA_AGENT")]
        agent: Option<String>,

        /// Also run the layout agent and print the markup
        #[arg(long)]
        render: bool,

        /// Call the provider in-process instead of a running gateway
        #[arg(long)]
        direct: bool,
    },

    /// List agent types
    Agents,

    /// Manage learner profiles
    Profiles {
        #[command(subcommand)]
        command: commands::profiles::ProfilesCommand,
    },
}

fn parse_layout_trigger(s: &str) -> Result<LayoutTrigger, String> {
    match s.to_ascii_lowercase().replace('-', "_").as_str() {
        "manual" => Ok(LayoutTrigger::Manual),
        "on_view_activate" => Ok(LayoutTrigger::OnViewActivate),
        other => Err(format!("unknown layout trigger '{other}' (manual, on-view-activate)")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat {
            agent,
            direct,
            layout_trigger,
        } => commands::chat::run(agent, direct, layout_trigger).await?,
        Commands::Ask {
            message,
            agent,
            render,
            direct,
        } => commands::ask::run(message, agent, render, direct).await?,
        Commands::Agents => commands::agents::run()?,
        Commands::Profiles { command } => commands::profiles::run(command)?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_trigger_accepts_both_spellings() {
        assert_eq!(parse_layout_trigger("manual"), Ok(LayoutTrigger::Manual));
        assert_eq!(
            parse_layout_trigger("on-view-activate"),
            Ok(LayoutTrigger::OnViewActivate)
        );
        assert_eq!(
            parse_layout_trigger("ON_VIEW_ACTIVATE"),
            Ok(LayoutTrigger::OnViewActivate)
        );
        assert!(parse_layout_trigger("always").is_err());
    }

    #[test]
    fn cli_parses_ask() {
        let cli = Cli::try_parse_from(["aula", "ask", "-m", "Hi", "--agent", "junior", "--render"])
            .unwrap();
        match cli.command {
            Commands::Ask {
                message,
                agent,
                render,
                direct,
            } => {
                assert_eq!(message, "Hi");
                assert_eq!(agent.as_deref(), Some("junior"));
                assert!(render);
                assert!(!direct);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn cli_verifies() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
