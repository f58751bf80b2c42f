//! Progressive clearance: a full route is handed out in chunks that end at
//! taxiway decision points (nodes with more than two incident edges) or at
//! the destination.
//!
//! Consecutive chunks share their boundary node: a chunk ending at
//! intersection `T2` leaves the cursor on `T2`, and the next chunk starts
//! there. Once the cursor sits on the final node the next chunk is empty and
//! the cursor moves past the end, which marks the plan complete.

use crate::graph::AirfieldGraph;
use crate::models::{FlightPlan, NodeId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Nodes from the cursor position to the chunk end, inclusive
    pub nodes: Vec<NodeId>,
    pub new_cursor: usize,
    /// The chunk stops at an intersection rather than the route end
    pub ends_at_decision: bool,
}

impl Chunk {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Clearance limit of the chunk.
    pub fn limit(&self) -> Option<&NodeId> {
        self.nodes.last()
    }
}

/// Compute the next chunk for `plan` without touching it.
pub fn next_chunk(plan: &FlightPlan, graph: &AirfieldGraph) -> Chunk {
    let path = plan.full_path();
    let cursor = plan.progress_cursor();
    let Some(last) = path.len().checked_sub(1) else {
        return Chunk {
            nodes: Vec::new(),
            new_cursor: 0,
            ends_at_decision: false,
        };
    };

    if cursor >= last {
        return Chunk {
            nodes: Vec::new(),
            new_cursor: path.len(),
            ends_at_decision: false,
        };
    }

    let decision = (cursor + 1..=last).find(|&i| graph.is_decision_node(path[i].as_str()));
    let (end, ends_at_decision) = match decision {
        Some(i) => (i, true),
        None => (last, false),
    };

    Chunk {
        nodes: path[cursor..=end].to_vec(),
        new_cursor: end,
        ends_at_decision,
    }
}

/// Drives the issuance cursor of flight plans.
pub struct ClearanceSegmenter<'g> {
    graph: &'g AirfieldGraph,
}

impl<'g> ClearanceSegmenter<'g> {
    pub fn new(graph: &'g AirfieldGraph) -> Self {
        Self { graph }
    }

    pub fn peek(&self, plan: &FlightPlan) -> Chunk {
        next_chunk(plan, self.graph)
    }

    /// Compute the next chunk and commit the cursor. An empty chunk means
    /// the plan is complete.
    pub fn issue(&self, plan: &mut FlightPlan) -> Chunk {
        let chunk = next_chunk(plan, self.graph);
        plan.advance_cursor(chunk.new_cursor);
        chunk
    }
}
