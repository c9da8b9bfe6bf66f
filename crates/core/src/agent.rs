//! Agent types — the closed set of personas a completion can be routed to.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

use crate::error::GatewayError;

/// Identifier selecting a system prompt (and, indirectly, provider routing).
///
/// This is the only place agent identifiers are defined. Strings from the
/// outside world go through [`FromStr`], which rejects anything unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AgentType {
    /// Primary-school learners (6-8)
    Junior,
    /// Secondary-school learners (12-15)
    Middle,
    /// Older students (16+)
    Senior,
    /// General educational assistant
    Default,
    /// Andrea, the playful tutor persona
    Andrea,
    /// The formatting agent that turns answers into presentational markup
    Layout,
}

impl AgentType {
    pub const ALL: [AgentType; 6] = [
        AgentType::Junior,
        AgentType::Middle,
        AgentType::Senior,
        AgentType::Default,
        AgentType::Andrea,
        AgentType::Layout,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Junior => "junior",
            AgentType::Middle => "middle",
            AgentType::Senior => "senior",
            AgentType::Default => "default",
            AgentType::Andrea => "andrea",
            AgentType::Layout => "layout",
        }
    }

    /// Whether this agent produces markup rather than conversational answers.
    pub fn is_layout(&self) -> bool {
        matches!(self, AgentType::Layout)
    }
}

impl FromStr for AgentType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "junior" => Ok(AgentType::Junior),
            "middle" => Ok(AgentType::Middle),
            "senior" => Ok(AgentType::Senior),
            "default" => Ok(AgentType::Default),
            "andrea" => Ok(AgentType::Andrea),
            // "maquetin" is what the layout agent was called in earlier clients
            "layout" | "maquetin" => Ok(AgentType::Layout),
            _ => Err(GatewayError::ClientInput(format!(
                "No system prompt found for agentType: {s}"
            ))),
        }
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AgentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AgentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
