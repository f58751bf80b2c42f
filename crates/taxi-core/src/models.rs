//! Core data models for the taxi planner.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Identifier of a taxi network node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Identifier of a ground agent (aircraft or service vehicle).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AgentId(pub u32);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Planar position in local airfield units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Ordinary taxiway point or intersection
    #[default]
    Taxiway,
    /// Point on a runway surface
    Runway,
    /// Gate, stand or other spawn point
    Spawn,
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "taxiway" => Ok(NodeKind::Taxiway),
            "runway" => Ok(NodeKind::Runway),
            "spawn" | "gate" | "stand" => Ok(NodeKind::Spawn),
            other => Err(format!("unknown node kind '{}'", other)),
        }
    }
}

/// A node of the airfield graph. Immutable once added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Point,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentKind {
    #[default]
    Aircraft,
    Vehicle,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// Waiting for the next clearance chunk
    #[default]
    AwaitingInstruction,
    /// Executing an issued chunk
    Moving,
    /// Halted in place (technical stop); its node is blocked for new plans
    Stopped,
    /// Route complete, no further clearances
    Arrived,
}

/// An agent's complete computed route plus issuance progress.
///
/// The cursor marks the start of the next unissued chunk. It only moves
/// forward, and only the clearance segmenter moves it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawFlightPlan")]
pub struct FlightPlan {
    pub agent_id: AgentId,
    full_path: Vec<NodeId>,
    progress_cursor: usize,
}

/// Unchecked wire form of a [`FlightPlan`].
#[derive(Deserialize)]
struct RawFlightPlan {
    agent_id: AgentId,
    full_path: Vec<NodeId>,
    #[serde(default)]
    progress_cursor: usize,
}

impl TryFrom<RawFlightPlan> for FlightPlan {
    type Error = String;

    fn try_from(raw: RawFlightPlan) -> Result<Self, Self::Error> {
        if raw.full_path.is_empty() {
            return Err(format!("flight plan for agent {} has an empty path", raw.agent_id));
        }
        if raw.progress_cursor > raw.full_path.len() {
            return Err(format!(
                "flight plan cursor {} is past the end of a {}-node path",
                raw.progress_cursor,
                raw.full_path.len()
            ));
        }
        Ok(Self {
            agent_id: raw.agent_id,
            full_path: raw.full_path,
            progress_cursor: raw.progress_cursor,
        })
    }
}

impl FlightPlan {
    /// Create a plan from a non-empty route. Returns `None` for an empty path.
    pub fn new(agent_id: AgentId, full_path: Vec<NodeId>) -> Option<Self> {
        if full_path.is_empty() {
            return None;
        }
        Some(Self {
            agent_id,
            full_path,
            progress_cursor: 0,
        })
    }

    pub fn full_path(&self) -> &[NodeId] {
        &self.full_path
    }

    pub fn progress_cursor(&self) -> usize {
        self.progress_cursor
    }

    /// Nodes not yet issued, starting at the cursor.
    pub fn unflown_tail(&self) -> &[NodeId] {
        let start = self.progress_cursor.min(self.full_path.len());
        &self.full_path[start..]
    }

    pub fn origin(&self) -> &NodeId {
        &self.full_path[0]
    }

    pub fn destination(&self) -> &NodeId {
        &self.full_path[self.full_path.len() - 1]
    }

    pub fn is_complete(&self) -> bool {
        self.progress_cursor >= self.full_path.len()
    }

    pub(crate) fn advance_cursor(&mut self, new_cursor: usize) {
        debug_assert!(new_cursor >= self.progress_cursor);
        self.progress_cursor = self.progress_cursor.max(new_cursor);
    }
}

/// A live ground agent together with the flight plan it owns.
///
/// Dropping the agent drops its plan, so a removed agent can never leak into
/// reservation snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub is_arrival: bool,
    pub(crate) current_node: NodeId,
    pub(crate) status: AgentStatus,
    /// Cleared nodes still ahead of the agent, next target first
    pub(crate) clearance: VecDeque<NodeId>,
    pub(crate) plan: FlightPlan,
}

impl Agent {
    pub(crate) fn new(kind: AgentKind, is_arrival: bool, plan: FlightPlan) -> Self {
        Self {
            id: plan.agent_id,
            kind,
            is_arrival,
            current_node: plan.origin().clone(),
            status: AgentStatus::AwaitingInstruction,
            clearance: VecDeque::new(),
            plan,
        }
    }

    pub fn current_node(&self) -> &NodeId {
        &self.current_node
    }

    pub fn status(&self) -> AgentStatus {
        self.status
    }

    pub fn plan(&self) -> &FlightPlan {
        &self.plan
    }

    pub fn destination(&self) -> &NodeId {
        self.plan.destination()
    }

    /// Next node the agent is cleared to, if any.
    pub fn target_node(&self) -> Option<&NodeId> {
        self.clearance.front()
    }

    pub fn remaining_clearance(&self) -> impl Iterator<Item = &NodeId> {
        self.clearance.iter()
    }

    /// Where the agent will drive: current node, the unfinished part of its
    /// issued chunk, then the unissued tail of its plan. Consecutive repeats
    /// (the chunk boundary node) are collapsed.
    pub fn projected_route(&self) -> Vec<NodeId> {
        let mut route: Vec<NodeId> = Vec::with_capacity(
            1 + self.clearance.len() + self.plan.unflown_tail().len(),
        );
        let sequence = std::iter::once(&self.current_node)
            .chain(self.clearance.iter())
            .chain(self.plan.unflown_tail().iter());
        for node in sequence {
            if route.last() != Some(node) {
                route.push(node.clone());
            }
        }
        route
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_parses_loader_strings() {
        assert_eq!("runway".parse::<NodeKind>().unwrap(), NodeKind::Runway);
        assert_eq!(" Spawn ".parse::<NodeKind>().unwrap(), NodeKind::Spawn);
        assert_eq!("gate".parse::<NodeKind>().unwrap(), NodeKind::Spawn);
        assert!("apron".parse::<NodeKind>().is_err());
    }

    #[test]
    fn node_kind_serializes_lowercase() {
        let json = serde_json::to_string(&NodeKind::Runway).unwrap();
        assert_eq!(json, "\"runway\"");
        let id: NodeId = serde_json::from_str("\"G1\"").unwrap();
        assert_eq!(id.as_str(), "G1");
    }

    #[test]
    fn flight_plan_rejects_empty_path() {
        assert!(FlightPlan::new(AgentId(1), Vec::new()).is_none());
    }

    #[test]
    fn flight_plan_deserialization_checks_path_and_cursor() {
        let empty = serde_json::from_str::<FlightPlan>(
            r#"{"agent_id":1,"full_path":[],"progress_cursor":0}"#,
        );
        assert!(empty.unwrap_err().to_string().contains("empty path"));

        let overrun = serde_json::from_str::<FlightPlan>(
            r#"{"agent_id":1,"full_path":["A","B"],"progress_cursor":3}"#,
        );
        assert!(overrun.is_err());

        let plan: FlightPlan =
            serde_json::from_str(r#"{"agent_id":4,"full_path":["A","B"],"progress_cursor":2}"#)
                .unwrap();
        assert!(plan.is_complete());
        assert_eq!(plan.destination().as_str(), "B");

        let agent = serde_json::from_str::<Agent>(
            r#"{"id":4,"kind":"aircraft","is_arrival":false,"current_node":"A",
                "status":"moving","clearance":["B"],
                "plan":{"agent_id":4,"full_path":[],"progress_cursor":0}}"#,
        );
        assert!(agent.is_err());
    }

    #[test]
    fn flight_plan_cursor_never_moves_backwards() {
        let mut plan =
            FlightPlan::new(AgentId(1), vec!["A".into(), "B".into(), "C".into()]).unwrap();
        plan.advance_cursor(2);
        assert_eq!(plan.unflown_tail(), &[NodeId::from("C")]);
        assert_eq!(plan.origin().as_str(), "A");
        assert_eq!(plan.destination().as_str(), "C");
        assert!(!plan.is_complete());
        plan.advance_cursor(3);
        assert!(plan.is_complete());
        assert!(plan.unflown_tail().is_empty());
    }

    #[test]
    fn projected_route_collapses_chunk_boundary() {
        let path: Vec<NodeId> = ["G1", "T1", "T2", "T3", "R1"].into_iter().map(NodeId::from).collect();
        let mut plan = FlightPlan::new(AgentId(7), path.clone()).unwrap();
        plan.advance_cursor(2);
        let mut agent = Agent::new(AgentKind::Aircraft, false, plan);
        agent.clearance = ["T1", "T2"].into_iter().map(NodeId::from).collect();
        assert_eq!(agent.projected_route(), path);
        assert_eq!(agent.target_node().map(NodeId::as_str), Some("T1"));
    }
}
