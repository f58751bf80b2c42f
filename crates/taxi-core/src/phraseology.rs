//! ATC phraseology for clearance chunks and per-agent transcripts.

use crate::clearance::Chunk;
use crate::graph::{AirfieldGraph, DEFAULT_EDGE_NAME};
use crate::models::{AgentId, NodeId, NodeKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

const CALLSIGN_PREFIX: &str = "UKN";

pub fn callsign(agent_id: AgentId) -> String {
    format!("{}{}", CALLSIGN_PREFIX, agent_id)
}

/// Instruction issued for one clearance chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Instruction {
    /// Chunk ends on the destination runway
    LineUpAndWait {
        runway: NodeId,
        crossings: Vec<NodeId>,
    },
    /// Chunk ends on a runway the agent is not yet cleared onto
    HoldShort {
        runway: NodeId,
        via: Vec<String>,
        crossings: Vec<NodeId>,
    },
    TaxiToIntersection {
        limit: NodeId,
        via: Vec<String>,
        crossings: Vec<NodeId>,
    },
    ContinueTaxi {
        limit: NodeId,
        via: Vec<String>,
        crossings: Vec<NodeId>,
    },
    /// Route complete
    FrequencyChange,
}

impl Instruction {
    pub fn for_chunk(chunk: &Chunk, destination: &NodeId, graph: &AirfieldGraph) -> Self {
        let Some(limit) = chunk.limit() else {
            return Instruction::FrequencyChange;
        };
        let via = taxiways_used(&chunk.nodes, graph);
        let crossings = runway_crossings(&chunk.nodes, graph);
        let limit_is_runway = graph.kind(limit.as_str()) == Some(NodeKind::Runway);

        if limit_is_runway && limit == destination {
            Instruction::LineUpAndWait {
                runway: limit.clone(),
                crossings,
            }
        } else if limit_is_runway {
            Instruction::HoldShort {
                runway: limit.clone(),
                via,
                crossings,
            }
        } else if chunk.ends_at_decision {
            Instruction::TaxiToIntersection {
                limit: limit.clone(),
                via,
                crossings,
            }
        } else {
            Instruction::ContinueTaxi {
                limit: limit.clone(),
                via,
                crossings,
            }
        }
    }
}

/// Named taxiways along the chunk in order; consecutive repeats and the
/// generic name are skipped.
fn taxiways_used(nodes: &[NodeId], graph: &AirfieldGraph) -> Vec<String> {
    let mut used: Vec<String> = Vec::new();
    for pair in nodes.windows(2) {
        let name = graph.edge_name(&pair[0], &pair[1]);
        if name == DEFAULT_EDGE_NAME || name.is_empty() {
            continue;
        }
        if used.last().map(String::as_str) != Some(name) {
            used.push(name.to_string());
        }
    }
    used
}

/// Runway nodes passed through: everything between the start position and
/// the clearance limit.
fn runway_crossings(nodes: &[NodeId], graph: &AirfieldGraph) -> Vec<NodeId> {
    if nodes.len() < 3 {
        return Vec::new();
    }
    nodes[1..nodes.len() - 1]
        .iter()
        .filter(|node| graph.kind(node.as_str()) == Some(NodeKind::Runway))
        .cloned()
        .collect()
}

struct Via<'a>(&'a [String]);

impl fmt::Display for Via<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, " via taxiways")
        } else {
            write!(f, " via {}", self.0.join(" "))
        }
    }
}

struct Crossings<'a>(&'a [NodeId]);

impl fmt::Display for Crossings<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for runway in self.0 {
            write!(f, "; Cross Runway {}", runway)?;
        }
        Ok(())
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::LineUpAndWait { runway, crossings } => {
                write!(f, "Runway {}, Line up and wait{}.", runway, Crossings(crossings))
            }
            Instruction::HoldShort {
                runway,
                via,
                crossings,
            } => write!(
                f,
                "Hold short of Runway {}{}{}.",
                runway,
                Via(via),
                Crossings(crossings)
            ),
            Instruction::TaxiToIntersection {
                limit,
                via,
                crossings,
            } => write!(
                f,
                "Taxi to intersection {}{}{}.",
                limit,
                Via(via),
                Crossings(crossings)
            ),
            Instruction::ContinueTaxi {
                limit,
                via,
                crossings,
            } => write!(
                f,
                "Continue taxi to {}{}{}.",
                limit,
                Via(via),
                Crossings(crossings)
            ),
            Instruction::FrequencyChange => write!(f, "Frequency change approved. Good day."),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    Pilot,
    Atc,
}

/// One radio exchange line, attributed to an agent by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transmission {
    pub agent_id: AgentId,
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Transmission {
    pub fn pilot(agent_id: AgentId, text: impl Into<String>) -> Self {
        Self {
            agent_id,
            speaker: Speaker::Pilot,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn atc(agent_id: AgentId, instruction: &Instruction) -> Self {
        Self {
            agent_id,
            speaker: Speaker::Atc,
            text: instruction.to_string(),
            at: Utc::now(),
        }
    }
}

impl fmt::Display for Transmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.speaker {
            Speaker::Pilot => write!(f, "{}: {}", callsign(self.agent_id), self.text),
            Speaker::Atc => write!(f, "ATC: {}, {}", callsign(self.agent_id), self.text),
        }
    }
}
