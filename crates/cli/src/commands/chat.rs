//! `aula chat` — Interactive chat with an optional visualization pane.

use aula_config::LayoutTrigger;
use aula_orchestrator::{RenderOutcome, RenderView, Session, SessionSettings, TurnOutcome, View};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(
    agent: Option<String>,
    direct: bool,
    layout_trigger: Option<LayoutTrigger>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;
    let agent = super::resolve_agent(agent.as_deref(), &config)?;
    let backend = super::build_backend(&config, direct)?;

    let mut settings = SessionSettings::from_config(&config.session, agent);
    if let Some(trigger) = layout_trigger {
        settings.layout_trigger = trigger;
    }
    let session = Session::new(backend, settings);

    println!();
    println!("  ╔══════════════════════════════════════════════╗");
    println!("  ║           Aula — Interactive Chat            ║");
    println!("  ╚══════════════════════════════════════════════╝");
    println!();
    println!("  Agent:    {agent}");
    println!("  Backend:  {}", if direct { "in-process" } else { config.client.gateway_url.as_str() });
    println!("  Layout:   {:?}", session.settings().layout_trigger);
    println!();
    println!("  Type your message and press Enter. /help lists commands.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "/quit" | "/exit" | "exit" => break,
            "/help" => print_help(),
            "/history" => {
                for msg in session.history() {
                    println!("  [{}] {}: {}", msg.timestamp.format("%H:%M:%S"), msg.role, msg.content);
                }
            }
            "/render" => match session.request_render().await {
                Ok(outcome) => print_render(&outcome, &session),
                Err(e) => eprintln!("  [Busy] {e}"),
            },
            "/view chat" => {
                session.activate_view(View::Chat).await?;
                println!("  (chat view)");
            }
            "/view visual" => match session.activate_view(View::Visualization).await {
                Ok(Some(outcome)) => print_render(&outcome, &session),
                Ok(None) => print_view(&session.render_view()),
                Err(e) => eprintln!("  [Busy] {e}"),
            },
            cmd if cmd.starts_with('/') => eprintln!("  Unknown command: {cmd} (try /help)"),
            _ => {
                eprint!("  ...");
                let outcome = session.submit(input).await;
                eprint!("\r     \r");
                match outcome {
                    Ok(TurnOutcome::Answered(reply)) => print_reply(&reply),
                    Ok(TurnOutcome::Apologized { reply, failure }) => {
                        eprintln!("  [Error] {failure}");
                        print_reply(&reply);
                    }
                    Err(e) => eprintln!("  [Error] {e}"),
                }
                if session.view() == View::Visualization {
                    print_view(&session.render_view());
                }
            }
        }
        prompt()?;
    }

    println!("\n  Goodbye!");
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn print_help() {
    println!("  /render        Lay out the latest answer");
    println!("  /view chat     Switch to the chat view");
    println!("  /view visual   Switch to the visualization view");
    println!("  /history       Show the conversation");
    println!("  /quit          Leave");
}

fn print_reply(reply: &str) {
    println!();
    for line in reply.lines() {
        println!("  Assistant > {line}");
    }
    println!();
}

fn print_render(outcome: &RenderOutcome, session: &Session) {
    match outcome {
        RenderOutcome::NothingToRender => println!("  (nothing to render yet)"),
        RenderOutcome::Unchanged => {
            println!("  (already rendered)");
            print_view(&session.render_view());
        }
        RenderOutcome::Rendered(_) | RenderOutcome::Failed(_) => print_view(&session.render_view()),
    }
}

fn print_view(view: &RenderView) {
    match view {
        RenderView::Empty => println!("  ┌ visualization: empty"),
        RenderView::Loading => println!("  ┌ visualization: loading..."),
        RenderView::Markup(markup) => {
            println!("  ┌ visualization");
            for line in markup.lines() {
                println!("  │ {line}");
            }
            println!("  └");
        }
        RenderView::Failed(failure) => println!("  ┌ visualization failed: {failure}"),
    }
}
