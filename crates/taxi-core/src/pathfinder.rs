//! Turn-aware A* over the airfield graph.
//!
//! The turn penalty depends on where the agent came from, so the search
//! state is `(node, arrived_from)` rather than the node alone. States live in
//! an arena indexed by that compound key; the open set is a lazy-deletion
//! binary heap.

use crate::cost::{CostModel, PlanningConstraints};
use crate::graph::AirfieldGraph;
use crate::models::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap};

/// Search key: a node together with the node it was entered from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchState {
    pub node: NodeId,
    pub arrived_from: Option<NodeId>,
}

#[derive(Debug)]
struct StateRecord {
    state: SearchState,
    g_score: f64,
    parent: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f_score: FloatOrd,
    g_score: FloatOrd,
    seq: u64,
    index: usize,
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.g_score.cmp(&other.g_score))
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Start to goal, inclusive
    pub nodes: Vec<NodeId>,
    pub cost: f64,
    pub nodes_expanded: usize,
}

/// Result of one search. `Unroutable` is an ordinary outcome: the goal is
/// blocked or disconnected under the current constraints.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found(Route),
    Unroutable { nodes_expanded: usize },
}

impl PathOutcome {
    pub fn route(&self) -> Option<&Route> {
        match self {
            PathOutcome::Found(route) => Some(route),
            PathOutcome::Unroutable { .. } => None,
        }
    }

    pub fn into_route(self) -> Option<Route> {
        match self {
            PathOutcome::Found(route) => Some(route),
            PathOutcome::Unroutable { .. } => None,
        }
    }

    /// Node sequence of a found route.
    pub fn path(&self) -> Option<&[NodeId]> {
        self.route().map(|route| route.nodes.as_slice())
    }

    pub fn is_found(&self) -> bool {
        matches!(self, PathOutcome::Found(_))
    }

    pub fn nodes_expanded(&self) -> usize {
        match self {
            PathOutcome::Found(route) => route.nodes_expanded,
            PathOutcome::Unroutable { nodes_expanded } => *nodes_expanded,
        }
    }
}

pub struct Pathfinder<'g> {
    graph: &'g AirfieldGraph,
    cost_model: CostModel,
}

impl<'g> Pathfinder<'g> {
    pub fn new(graph: &'g AirfieldGraph) -> Self {
        Self::with_cost_model(graph, CostModel::default())
    }

    pub fn with_cost_model(graph: &'g AirfieldGraph, cost_model: CostModel) -> Self {
        Self { graph, cost_model }
    }

    pub fn cost_model(&self) -> &CostModel {
        &self.cost_model
    }

    /// Cheapest route from `start` to `end` under `constraints`.
    pub fn find_path(
        &self,
        start: &NodeId,
        end: &NodeId,
        constraints: &PlanningConstraints,
    ) -> PathOutcome {
        if !self.graph.contains(start.as_str()) || !self.graph.contains(end.as_str()) {
            return PathOutcome::Unroutable { nodes_expanded: 0 };
        }

        let mut records: Vec<StateRecord> = Vec::new();
        let mut index: HashMap<SearchState, usize> = HashMap::new();
        let mut open_set: BinaryHeap<Reverse<OpenEntry>> = BinaryHeap::new();
        let mut seq = 0u64;

        let start_state = SearchState {
            node: start.clone(),
            arrived_from: None,
        };
        index.insert(start_state.clone(), 0);
        records.push(StateRecord {
            state: start_state,
            g_score: 0.0,
            parent: None,
        });
        open_set.push(Reverse(OpenEntry {
            f_score: FloatOrd(self.graph.heuristic(start.as_str(), end.as_str())),
            g_score: FloatOrd(0.0),
            seq,
            index: 0,
        }));

        let mut nodes_expanded = 0usize;

        while let Some(Reverse(entry)) = open_set.pop() {
            let record = &records[entry.index];
            if entry.g_score.0 > record.g_score {
                // Superseded by a cheaper push of the same state.
                continue;
            }
            nodes_expanded += 1;

            let current = record.state.node.clone();
            let prev = record.state.arrived_from.clone();
            let g = record.g_score;

            if &current == end {
                return PathOutcome::Found(Route {
                    nodes: reconstruct(&records, entry.index),
                    cost: g,
                    nodes_expanded,
                });
            }

            for neighbor in self.graph.neighbors(current.as_str()) {
                let Ok(step_cost) = self.cost_model.cost(
                    self.graph,
                    prev.as_ref(),
                    &current,
                    neighbor,
                    constraints,
                    end,
                ) else {
                    continue;
                };
                let tentative_g = g + step_cost;
                if !tentative_g.is_finite() {
                    continue;
                }

                let next_state = SearchState {
                    node: neighbor.clone(),
                    arrived_from: Some(current.clone()),
                };
                let next_index = match index.get(&next_state) {
                    Some(&existing) => {
                        if tentative_g >= records[existing].g_score {
                            continue;
                        }
                        records[existing].g_score = tentative_g;
                        records[existing].parent = Some(entry.index);
                        existing
                    }
                    None => {
                        let new_index = records.len();
                        index.insert(next_state.clone(), new_index);
                        records.push(StateRecord {
                            state: next_state,
                            g_score: tentative_g,
                            parent: Some(entry.index),
                        });
                        new_index
                    }
                };

                seq += 1;
                let h_score = self.graph.heuristic(neighbor.as_str(), end.as_str());
                open_set.push(Reverse(OpenEntry {
                    f_score: FloatOrd(tentative_g + h_score),
                    g_score: FloatOrd(tentative_g),
                    seq,
                    index: next_index,
                }));
            }
        }

        PathOutcome::Unroutable { nodes_expanded }
    }
}

fn reconstruct(records: &[StateRecord], goal_index: usize) -> Vec<NodeId> {
    let mut path = Vec::new();
    let mut current = Some(goal_index);
    while let Some(idx) = current {
        path.push(records[idx].state.node.clone());
        current = records[idx].parent;
    }
    path.reverse();
    path
}
