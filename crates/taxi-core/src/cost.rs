//! Step cost for one traversal `curr -> next`, arriving at `curr` from `prev`.
//!
//! Cost is base Euclidean distance plus non-negative penalties, so the
//! Euclidean heuristic stays admissible. Two conditions make a step
//! infeasible outright: entering a blocked node, and driving an edge that
//! another live agent has reserved in the opposite direction.

use crate::graph::AirfieldGraph;
use crate::models::{NodeId, NodeKind};
use crate::reservation::Reservations;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

pub const TURN_PENALTY_FACTOR: f64 = 0.1;
pub const U_TURN_THRESHOLD_DEG: f64 = 170.0;
/// Finite so a reversal is still taken when nothing else reaches the goal.
pub const U_TURN_PENALTY: f64 = 50_000_000.0;
pub const RUNWAY_PENALTY: f64 = 500.0;
pub const CONGESTION_PENALTY: f64 = 1_000.0;
/// Passing through a gate that is not the destination.
pub const GATE_BLOCK_PENALTY: f64 = 5_000_000.0;

/// Penalty weights. The defaults are the planner's contract; the penalty
/// tiers only stay separated while path distances remain far below
/// `GATE_BLOCK_PENALTY`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostModel {
    pub turn_penalty_factor: f64,
    pub u_turn_threshold_deg: f64,
    pub u_turn_penalty: f64,
    pub runway_penalty: f64,
    pub congestion_penalty: f64,
    pub gate_block_penalty: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            turn_penalty_factor: TURN_PENALTY_FACTOR,
            u_turn_threshold_deg: U_TURN_THRESHOLD_DEG,
            u_turn_penalty: U_TURN_PENALTY,
            runway_penalty: RUNWAY_PENALTY,
            congestion_penalty: CONGESTION_PENALTY,
            gate_block_penalty: GATE_BLOCK_PENALTY,
        }
    }
}

/// Hard and soft inputs for one planning call.
#[derive(Debug, Clone, Default)]
pub struct PlanningConstraints {
    /// Nodes that may not be entered (e.g. occupied by a stopped agent)
    pub blocked: HashSet<NodeId>,
    /// Directed edges and node counts announced by live agents
    pub reservations: Reservations,
}

impl PlanningConstraints {
    pub fn new(blocked: HashSet<NodeId>, reservations: Reservations) -> Self {
        Self {
            blocked,
            reservations,
        }
    }
}

/// Why a step cannot be taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Infeasible {
    Blocked,
    HeadOn,
    UnknownNode,
    NonFinite,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CostBreakdown {
    pub distance: f64,
    pub turn: f64,
    pub runway: f64,
    pub congestion: f64,
    pub gate_block: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.distance + self.turn + self.runway + self.congestion + self.gate_block
    }
}

impl CostModel {
    /// Cost of moving `curr -> next`, or the reason the move is infeasible.
    pub fn cost(
        &self,
        graph: &AirfieldGraph,
        prev: Option<&NodeId>,
        curr: &NodeId,
        next: &NodeId,
        constraints: &PlanningConstraints,
        final_dest: &NodeId,
    ) -> Result<f64, Infeasible> {
        let total = self
            .breakdown(graph, prev, curr, next, constraints, final_dest)?
            .total();
        if total.is_finite() {
            Ok(total)
        } else {
            Err(Infeasible::NonFinite)
        }
    }

    /// Itemised penalties for a step.
    pub fn breakdown(
        &self,
        graph: &AirfieldGraph,
        prev: Option<&NodeId>,
        curr: &NodeId,
        next: &NodeId,
        constraints: &PlanningConstraints,
        final_dest: &NodeId,
    ) -> Result<CostBreakdown, Infeasible> {
        if constraints.blocked.contains(next) {
            return Err(Infeasible::Blocked);
        }
        // Someone travelling next -> curr owns this edge.
        if constraints.reservations.is_reserved(next, curr) {
            return Err(Infeasible::HeadOn);
        }

        let (Some(curr_node), Some(next_node)) = (graph.node(curr.as_str()), graph.node(next.as_str()))
        else {
            return Err(Infeasible::UnknownNode);
        };

        let mut breakdown = CostBreakdown {
            distance: curr_node.position.distance_to(&next_node.position),
            ..CostBreakdown::default()
        };

        if let Some(prev) = prev {
            let angle = graph.turn_angle(prev.as_str(), curr.as_str(), next.as_str());
            breakdown.turn = angle.powi(2) * self.turn_penalty_factor;
            if angle > self.u_turn_threshold_deg {
                breakdown.turn += self.u_turn_penalty;
            }
        }

        if curr_node.kind == NodeKind::Runway || next_node.kind == NodeKind::Runway {
            breakdown.runway = self.runway_penalty;
        }

        breakdown.congestion =
            f64::from(constraints.reservations.congestion_at(next)) * self.congestion_penalty;

        if next_node.kind == NodeKind::Spawn && next != final_dest {
            breakdown.gate_block = self.gate_block_penalty;
        }

        Ok(breakdown)
    }
}
