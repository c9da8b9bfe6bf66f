//! `aula agents` — List the agent types the gateway accepts.

use aula_core::AgentType;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    for agent in AgentType::ALL {
        let note = if agent.is_layout() {
            "  (layout; alias: maquetin)"
        } else {
            ""
        };
        println!("  {agent}{note}");
    }
    Ok(())
}
