//! Prompt registry — maps each agent type to its system prompt.

use std::collections::HashMap;

use crate::agent::AgentType;
use crate::error::{GatewayError, Result};

const JUNIOR_PROMPT: &str = "\
You are an educational assistant for primary-school children (6-8 years old).
Answer in a friendly, simple and colourful way.
Every answer should include:
1. A short, clear explanation adapted to young children
2. A visual or fun example
3. A small interactive activity when it makes sense
Use relevant emojis and keep sentences short.";

const MIDDLE_PROMPT: &str = "\
You are an educational assistant for secondary-school students (12-15 years old).
Answer in an informative and engaging way.
Every answer should include:
1. A clear explanation with the details that matter at this age
2. Practical examples connected to everyday life
3. Reflection questions or small challenges";

const SENIOR_PROMPT: &str = "\
You are an advanced educational assistant for older students (16+ years old).
Answer with academic depth.
Every answer should include:
1. A detailed explanation with precise concepts and terminology
2. References to the relevant theories or principles
3. Practical applications or real-world examples
4. Suggestions for going further";

const DEFAULT_PROMPT: &str = "\
You are a patient, encouraging educational assistant.
Explain concepts step by step, check understanding with a short question at
the end, and adapt the level of detail to the way the learner writes.";

const ANDREA_PROMPT: &str = "\
You are Andrea, a cheerful tutor who helps children learn through play.
Turn every topic into a small adventure: use stories, riddles and exercises
the child can solve on paper. Celebrate effort, keep the tone warm, and
finish each answer with a short set of practice exercises.";

const LAYOUT_PROMPT: &str = "\
You are a layout assistant. You receive educational content written for a
child and turn it into a self-contained HTML fragment ready to be shown on
screen or printed.
Rules:
- Output only the HTML fragment: no explanations, no markdown, no code fences.
- Use semantic tags (<h1>, <h2>, <p>, <ul>, <ol>, <li>, <table>) and inline
  styles with bright, friendly colours.
- Keep every exercise from the original content and leave visible space for
  the child to write answers.
- Do not include <script> tags or external resources.";

/// Static mapping from agent type to system prompt.
///
/// Built once at startup. Every [`AgentType`] has a non-empty prompt in the
/// builtin registry, and overrides are rejected when empty, so a registry
/// that was constructed successfully resolves every agent type.
#[derive(Debug, Clone)]
pub struct PromptRegistry {
    prompts: HashMap<AgentType, String>,
}

impl PromptRegistry {
    /// The prompts shipped with Aula.
    pub fn builtin() -> Self {
        let prompts = AgentType::ALL
            .iter()
            .map(|agent| (*agent, builtin_prompt(*agent).to_string()))
            .collect();
        Self { prompts }
    }

    /// Replace the prompts of the given agent types.
    pub fn with_overrides(
        mut self,
        overrides: impl IntoIterator<Item = (AgentType, String)>,
    ) -> Result<Self> {
        for (agent, prompt) in overrides {
            if prompt.trim().is_empty() {
                return Err(GatewayError::Configuration(format!(
                    "prompt override for '{agent}' is empty"
                )));
            }
            self.prompts.insert(agent, prompt);
        }
        Ok(self)
    }

    /// Look up the system prompt for an agent type.
    pub fn resolve(&self, agent: AgentType) -> Result<&str> {
        self.prompts
            .get(&agent)
            .map(String::as_str)
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| {
                GatewayError::ClientInput(format!("No system prompt found for agentType: {agent}"))
            })
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

fn builtin_prompt(agent: AgentType) -> &'static str {
    match agent {
        AgentType::Junior => JUNIOR_PROMPT,
        AgentType::Middle => MIDDLE_PROMPT,
        AgentType::Senior => SENIOR_PROMPT,
        AgentType::Default => DEFAULT_PROMPT,
        AgentType::Andrea => ANDREA_PROMPT,
        AgentType::Layout => LAYOUT_PROMPT,
    }
}
