//! Error types for graph construction and traffic coordination.

use crate::models::{AgentId, NodeId};
use thiserror::Error;

/// Airfield configuration errors raised while building the graph.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("edge {from}-{to} references unknown node {missing}")]
    UnknownNode {
        from: NodeId,
        to: NodeId,
        missing: NodeId,
    },
    #[error("edge {0}-{0} connects a node to itself")]
    SelfLoop(NodeId),
}

/// Misuse of the traffic coordinator by a collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficError {
    #[error("agent {0} is not live")]
    UnknownAgent(AgentId),
    #[error("node {0} is not part of the airfield")]
    UnknownNode(NodeId),
    #[error("agent {agent_id} reported {reported} but its next cleared node is {expected:?}")]
    UnexpectedPosition {
        agent_id: AgentId,
        reported: NodeId,
        expected: Option<NodeId>,
    },
}
