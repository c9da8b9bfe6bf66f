//! `aula ask` — Single-message mode.

use aula_orchestrator::{RenderOutcome, Session, SessionSettings, TurnOutcome};

pub async fn run(
    message: String,
    agent: Option<String>,
    render: bool,
    direct: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let agent = super::resolve_agent(agent.as_deref(), &config)?;
    let backend = super::build_backend(&config, direct)?;
    let session = Session::new(backend, SessionSettings::from_config(&config.session, agent));

    eprint!("  Thinking...");
    let outcome = session.submit(&message).await?;
    eprint!("\r              \r");

    match &outcome {
        TurnOutcome::Answered(reply) => println!("{reply}"),
        TurnOutcome::Apologized { reply, failure } => {
            eprintln!("  [Error] {failure}");
            println!("{reply}");
            return Err("The agent could not answer.".into());
        }
    }

    if render {
        match session.request_render().await? {
            RenderOutcome::Rendered(markup) => {
                println!();
                println!("{markup}");
            }
            RenderOutcome::Failed(failure) => {
                eprintln!("  [Layout error] {failure}");
                return Err("The layout agent could not render the answer.".into());
            }
            RenderOutcome::Unchanged | RenderOutcome::NothingToRender => {}
        }
    }

    Ok(())
}
