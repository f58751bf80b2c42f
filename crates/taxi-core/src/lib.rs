pub mod clearance;
pub mod cost;
pub mod error;
pub mod graph;
pub mod models;
pub mod pathfinder;
pub mod phraseology;
pub mod reservation;
pub mod traffic;

pub use clearance::{next_chunk, Chunk, ClearanceSegmenter};
pub use cost::{
    CostBreakdown, CostModel, Infeasible, PlanningConstraints, CONGESTION_PENALTY,
    GATE_BLOCK_PENALTY, RUNWAY_PENALTY, TURN_PENALTY_FACTOR, U_TURN_PENALTY,
    U_TURN_THRESHOLD_DEG,
};
pub use error::{GraphError, TrafficError};
pub use graph::{AirfieldGraph, Edge, DEFAULT_EDGE_NAME, DEFAULT_EDGE_WEIGHT};
pub use models::{
    Agent, AgentId, AgentKind, AgentStatus, FlightPlan, Node, NodeId, NodeKind, Point,
};
pub use pathfinder::{PathOutcome, Pathfinder, Route, SearchState};
pub use phraseology::{callsign, Instruction, Speaker, Transmission};
pub use reservation::{compute_reservations, DirectedEdge, Reservations};
pub use traffic::{ClearanceEvent, RetiredAgent, SpawnOutcome, TaxiRequest, TrafficCoordinator};
