//! Global reservations derived from the projected routes of live agents.
//!
//! A snapshot is taken once per spawn, right before the new agent is planned.
//! Agents planned earlier are never re-evaluated against later ones, so spawn
//! order acts as right-of-way.

use crate::models::{Agent, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A directed traversal `from -> to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DirectedEdge {
    pub from: NodeId,
    pub to: NodeId,
}

impl DirectedEdge {
    pub fn new(from: impl Into<NodeId>, to: impl Into<NodeId>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reservations {
    /// Directed edges some live agent will drive
    reserved_edges: HashSet<DirectedEdge>,
    /// Occurrences of each node across live agents' projected routes. A route
    /// that revisits a node counts it once per visit.
    congestion: HashMap<NodeId, u32>,
}

impl Reservations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reserve(&mut self, from: NodeId, to: NodeId) {
        self.reserved_edges.insert(DirectedEdge { from, to });
    }

    pub fn add_congestion(&mut self, node: NodeId) {
        *self.congestion.entry(node).or_insert(0) += 1;
    }

    /// True if some live agent will drive `from -> to`.
    pub fn is_reserved(&self, from: &NodeId, to: &NodeId) -> bool {
        self.reserved_edges
            .contains(&DirectedEdge::new(from.clone(), to.clone()))
    }

    pub fn congestion_at(&self, node: &NodeId) -> u32 {
        self.congestion.get(node).copied().unwrap_or(0)
    }

    pub fn reserved_edges(&self) -> &HashSet<DirectedEdge> {
        &self.reserved_edges
    }

    pub fn congestion(&self) -> &HashMap<NodeId, u32> {
        &self.congestion
    }

    pub fn is_empty(&self) -> bool {
        self.reserved_edges.is_empty() && self.congestion.is_empty()
    }

    /// Reserve every consecutive pair of `route` and count each occurrence
    /// of every node.
    pub fn add_route(&mut self, route: &[NodeId]) {
        for pair in route.windows(2) {
            self.reserve(pair[0].clone(), pair[1].clone());
        }
        for node in route {
            self.add_congestion(node.clone());
        }
    }
}

/// Build the snapshot used to plan the next agent.
///
/// Only the agents passed in contribute. Callers pass the currently live
/// set, excluding the agent being planned.
pub fn compute_reservations<'a, I>(live_agents: I) -> Reservations
where
    I: IntoIterator<Item = &'a Agent>,
{
    let mut reservations = Reservations::new();
    for agent in live_agents {
        reservations.add_route(&agent.projected_route());
    }
    reservations
}
