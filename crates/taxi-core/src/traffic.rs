//! Traffic coordinator: owns the live agents, plans new ones against the
//! reservations of those already moving, and issues progressive clearances.
//!
//! Planning is one-shot and sequential. An agent's route is computed once at
//! spawn against the agents already live; it is never revised when later
//! agents arrive or when someone stops.

use crate::clearance::{Chunk, ClearanceSegmenter};
use crate::cost::{CostModel, PlanningConstraints};
use crate::error::TrafficError;
use crate::graph::AirfieldGraph;
use crate::models::{Agent, AgentId, AgentKind, AgentStatus, FlightPlan, NodeId};
use crate::pathfinder::{PathOutcome, Pathfinder, Route};
use crate::phraseology::{Instruction, Transmission};
use crate::reservation::compute_reservations;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

const FIRST_AGENT_ID: u32 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxiRequest {
    pub start: NodeId,
    pub destination: NodeId,
    #[serde(default)]
    pub kind: AgentKind,
    #[serde(default)]
    pub is_arrival: bool,
}

impl TaxiRequest {
    pub fn new(start: impl Into<NodeId>, destination: impl Into<NodeId>) -> Self {
        Self {
            start: start.into(),
            destination: destination.into(),
            kind: AgentKind::Aircraft,
            is_arrival: false,
        }
    }

    pub fn arrival(mut self) -> Self {
        self.is_arrival = true;
        self
    }

    pub fn vehicle(mut self) -> Self {
        self.kind = AgentKind::Vehicle;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpawnOutcome {
    Planned { agent_id: AgentId, route: Route },
    /// No route under the current reservations; the caller may retry later.
    Unroutable { nodes_expanded: usize },
}

impl SpawnOutcome {
    pub fn agent_id(&self) -> Option<AgentId> {
        match self {
            SpawnOutcome::Planned { agent_id, .. } => Some(*agent_id),
            SpawnOutcome::Unroutable { .. } => None,
        }
    }
}

/// A clearance handed to the motion executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClearanceEvent {
    pub agent_id: AgentId,
    pub chunk: Chunk,
    pub instruction: Instruction,
}

/// An agent taken out of the live set, with its radio log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetiredAgent {
    pub agent: Agent,
    pub transcript: Vec<Transmission>,
}

pub struct TrafficCoordinator {
    cost_model: CostModel,
    agents: BTreeMap<AgentId, Agent>,
    transcripts: HashMap<AgentId, Vec<Transmission>>,
    next_agent_id: u32,
}

impl Default for TrafficCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl TrafficCoordinator {
    pub fn new() -> Self {
        Self::with_cost_model(CostModel::default())
    }

    pub fn with_cost_model(cost_model: CostModel) -> Self {
        Self {
            cost_model,
            agents: BTreeMap::new(),
            transcripts: HashMap::new(),
            next_agent_id: FIRST_AGENT_ID,
        }
    }

    /// Constraints a new agent would be planned against right now.
    pub fn planning_constraints(&self) -> PlanningConstraints {
        PlanningConstraints::new(self.blocked_nodes(), compute_reservations(self.agents.values()))
    }

    /// Current nodes of agents halted in place.
    pub fn blocked_nodes(&self) -> HashSet<NodeId> {
        self.agents
            .values()
            .filter(|agent| agent.status == AgentStatus::Stopped)
            .map(|agent| agent.current_node.clone())
            .collect()
    }

    /// Plan a new agent against every live agent and register it when a
    /// route exists.
    pub fn request_taxi(
        &mut self,
        graph: &AirfieldGraph,
        request: TaxiRequest,
    ) -> Result<SpawnOutcome, TrafficError> {
        for node in [&request.start, &request.destination] {
            if !graph.contains(node.as_str()) {
                return Err(TrafficError::UnknownNode(node.clone()));
            }
        }

        let constraints = self.planning_constraints();
        let pathfinder = Pathfinder::with_cost_model(graph, self.cost_model.clone());
        let route = match pathfinder.find_path(&request.start, &request.destination, &constraints) {
            PathOutcome::Found(route) => route,
            PathOutcome::Unroutable { nodes_expanded } => {
                tracing::debug!(
                    start = %request.start,
                    destination = %request.destination,
                    live_agents = self.agents.len(),
                    "No route under current reservations"
                );
                return Ok(SpawnOutcome::Unroutable { nodes_expanded });
            }
        };

        let agent_id = AgentId(self.next_agent_id);
        let Some(plan) = FlightPlan::new(agent_id, route.nodes.clone()) else {
            return Ok(SpawnOutcome::Unroutable {
                nodes_expanded: route.nodes_expanded,
            });
        };
        self.next_agent_id += 1;

        tracing::info!(
            agent_id = %agent_id,
            start = %request.start,
            destination = %request.destination,
            nodes = route.nodes.len(),
            cost = route.cost,
            "Flight plan created"
        );

        self.agents.insert(
            agent_id,
            Agent::new(request.kind, request.is_arrival, plan),
        );
        self.record(Transmission::pilot(agent_id, "Requesting taxi."));

        Ok(SpawnOutcome::Planned { agent_id, route })
    }

    /// Issue the next chunk to every agent awaiting instruction. Agents whose
    /// plan is exhausted become `Arrived`.
    pub fn issue_clearances(&mut self, graph: &AirfieldGraph) -> Vec<ClearanceEvent> {
        let segmenter = ClearanceSegmenter::new(graph);
        let mut events = Vec::new();

        for agent in self.agents.values_mut() {
            if agent.status != AgentStatus::AwaitingInstruction {
                continue;
            }

            let chunk = segmenter.issue(&mut agent.plan);
            let instruction = Instruction::for_chunk(&chunk, agent.plan.destination(), graph);

            if chunk.is_empty() {
                agent.status = AgentStatus::Arrived;
                tracing::info!(agent_id = %agent.id, node = %agent.current_node, "Arrived");
            } else {
                agent.clearance = chunk
                    .nodes
                    .iter()
                    .skip_while(|node| **node == agent.current_node)
                    .cloned()
                    .collect();
                agent.status = if agent.clearance.is_empty() {
                    AgentStatus::AwaitingInstruction
                } else {
                    AgentStatus::Moving
                };
                tracing::debug!(
                    agent_id = %agent.id,
                    chunk_len = chunk.nodes.len(),
                    cursor = chunk.new_cursor,
                    "{}",
                    instruction
                );
            }

            self.transcripts
                .entry(agent.id)
                .or_default()
                .push(Transmission::atc(agent.id, &instruction));
            events.push(ClearanceEvent {
                agent_id: agent.id,
                chunk,
                instruction,
            });
        }

        events
    }

    /// The motion executor reports that `agent_id` reached `node`, which must
    /// be the next node of its clearance.
    pub fn report_position(
        &mut self,
        agent_id: AgentId,
        node: &NodeId,
    ) -> Result<AgentStatus, TrafficError> {
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(TrafficError::UnknownAgent(agent_id))?;

        if agent.status != AgentStatus::Moving || agent.clearance.front() != Some(node) {
            return Err(TrafficError::UnexpectedPosition {
                agent_id,
                reported: node.clone(),
                expected: agent.clearance.front().cloned(),
            });
        }

        agent.clearance.pop_front();
        agent.current_node = node.clone();
        if agent.clearance.is_empty() {
            agent.status = AgentStatus::AwaitingInstruction;
        }
        Ok(agent.status)
    }

    /// Halt an agent in place. Its node is blocked for agents planned while
    /// it stays stopped; existing plans are not revised.
    pub fn stop_agent(&mut self, agent_id: AgentId) -> Result<(), TrafficError> {
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(TrafficError::UnknownAgent(agent_id))?;
        if agent.status != AgentStatus::Arrived {
            agent.status = AgentStatus::Stopped;
            tracing::warn!(agent_id = %agent_id, node = %agent.current_node, "Agent stopped");
        }
        Ok(())
    }

    pub fn resume_agent(&mut self, agent_id: AgentId) -> Result<AgentStatus, TrafficError> {
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(TrafficError::UnknownAgent(agent_id))?;
        if agent.status == AgentStatus::Stopped {
            agent.status = if agent.clearance.is_empty() {
                AgentStatus::AwaitingInstruction
            } else {
                AgentStatus::Moving
            };
            tracing::info!(agent_id = %agent_id, "Agent resumed");
        }
        Ok(agent.status)
    }

    /// Remove an agent and its flight plan from all future reservations.
    /// Its transcript leaves the coordinator with it.
    pub fn remove_agent(&mut self, agent_id: AgentId) -> Option<RetiredAgent> {
        let agent = self.agents.remove(&agent_id)?;
        let transcript = self.transcripts.remove(&agent_id).unwrap_or_default();
        Some(RetiredAgent { agent, transcript })
    }

    pub fn remove_arrived(&mut self) -> Vec<RetiredAgent> {
        let arrived: Vec<AgentId> = self
            .agents
            .values()
            .filter(|agent| agent.status == AgentStatus::Arrived)
            .map(|agent| agent.id)
            .collect();
        arrived
            .into_iter()
            .filter_map(|agent_id| self.remove_agent(agent_id))
            .collect()
    }

    pub fn agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.agents.get(&agent_id)
    }

    /// Live agents in spawn order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn live_count(&self) -> usize {
        self.agents.len()
    }

    pub fn transcript(&self, agent_id: AgentId) -> &[Transmission] {
        self.transcripts
            .get(&agent_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn record(&mut self, transmission: Transmission) {
        self.transcripts
            .entry(transmission.agent_id)
            .or_default()
            .push(transmission);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NodeKind;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    fn scenario_graph() -> AirfieldGraph {
        let mut graph = AirfieldGraph::new();
        graph.add_node("G1", (0.0, 0.0), NodeKind::Spawn);
        graph.add_node("T1", (0.0, 10.0), NodeKind::Taxiway);
        graph.add_node("T2", (10.0, 10.0), NodeKind::Taxiway);
        graph.add_node("X", (10.0, 20.0), NodeKind::Taxiway);
        graph.add_node("T3", (20.0, 10.0), NodeKind::Taxiway);
        graph.add_node("R1", (20.0, 20.0), NodeKind::Runway);
        for (u, v) in [("G1", "T1"), ("T1", "T2"), ("T2", "X"), ("T2", "T3"), ("T3", "R1")] {
            graph.add_edge(u, v, None).unwrap();
        }
        graph
    }

    fn drive_chunk(coordinator: &mut TrafficCoordinator, agent_id: AgentId) {
        let ahead: Vec<NodeId> = coordinator
            .agent(agent_id)
            .unwrap()
            .remaining_clearance()
            .cloned()
            .collect();
        for node in ahead {
            coordinator.report_position(agent_id, &node).unwrap();
        }
    }

    #[test]
    fn head_on_request_waits_until_first_agent_leaves() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();

        let first = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "R1"))
            .unwrap();
        let first_id = first.agent_id().expect("first agent planned");

        let second = coordinator
            .request_taxi(&graph, TaxiRequest::new("R1", "G1").arrival())
            .unwrap();
        assert!(matches!(second, SpawnOutcome::Unroutable { .. }));
        assert_eq!(coordinator.live_count(), 1);

        assert!(coordinator.remove_agent(first_id).is_some());
        let retried = coordinator
            .request_taxi(&graph, TaxiRequest::new("R1", "G1").arrival())
            .unwrap();
        assert!(retried.agent_id().is_some());
    }

    #[test]
    fn full_lifecycle_issues_chunks_until_arrival() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        let agent_id = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "R1"))
            .unwrap()
            .agent_id()
            .unwrap();
        assert_eq!(agent_id, AgentId(100));

        let events = coordinator.issue_clearances(&graph);
        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0].chunk.nodes,
            vec![id("G1"), id("T1"), id("T2")]
        );
        assert_eq!(
            coordinator.agent(agent_id).unwrap().status(),
            AgentStatus::Moving
        );
        // Moving agents are not re-issued.
        assert!(coordinator.issue_clearances(&graph).is_empty());

        drive_chunk(&mut coordinator, agent_id);
        assert_eq!(
            coordinator.agent(agent_id).unwrap().status(),
            AgentStatus::AwaitingInstruction
        );

        let events = coordinator.issue_clearances(&graph);
        assert_eq!(events[0].chunk.nodes, vec![id("T2"), id("T3"), id("R1")]);
        assert_eq!(
            events[0].instruction.to_string(),
            "Runway R1, Line up and wait."
        );
        drive_chunk(&mut coordinator, agent_id);

        let events = coordinator.issue_clearances(&graph);
        assert_eq!(events[0].instruction, Instruction::FrequencyChange);
        assert_eq!(
            coordinator.agent(agent_id).unwrap().status(),
            AgentStatus::Arrived
        );
        assert!(coordinator.issue_clearances(&graph).is_empty());

        let removed = coordinator.remove_arrived();
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].agent.id, agent_id);
        assert_eq!(coordinator.live_count(), 0);

        let transcript: Vec<String> = removed[0]
            .transcript
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert_eq!(transcript.first().map(String::as_str), Some("UKN100: Requesting taxi."));
        assert_eq!(transcript.len(), 4);
        assert!(coordinator.transcript(agent_id).is_empty());
    }

    #[test]
    fn removed_agent_takes_its_transcript() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        let agent_id = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "R1"))
            .unwrap()
            .agent_id()
            .unwrap();
        coordinator.issue_clearances(&graph);
        assert_eq!(coordinator.transcript(agent_id).len(), 2);

        let retired = coordinator.remove_agent(agent_id).expect("agent was live");
        assert_eq!(retired.transcript.len(), 2);
        assert!(coordinator.transcript(agent_id).is_empty());
        assert!(coordinator.transcripts.is_empty());
        assert!(coordinator.remove_agent(agent_id).is_none());
    }

    #[test]
    fn reservations_shrink_as_agent_progresses() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        let agent_id = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "R1"))
            .unwrap()
            .agent_id()
            .unwrap();
        coordinator.issue_clearances(&graph);
        drive_chunk(&mut coordinator, agent_id);

        let constraints = coordinator.planning_constraints();
        let reservations = &constraints.reservations;
        assert!(!reservations.is_reserved(&id("G1"), &id("T1")));
        assert!(reservations.is_reserved(&id("T2"), &id("T3")));
        assert_eq!(reservations.congestion_at(&id("T2")), 1);
        assert_eq!(reservations.congestion_at(&id("G1")), 0);
    }

    #[test]
    fn stopped_agent_blocks_its_node() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        let vehicle = coordinator
            .request_taxi(&graph, TaxiRequest::new("X", "T2").vehicle())
            .unwrap()
            .agent_id()
            .unwrap();
        coordinator.stop_agent(vehicle).unwrap();
        assert!(coordinator.blocked_nodes().contains("X"));

        let outcome = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "X"))
            .unwrap();
        assert!(matches!(outcome, SpawnOutcome::Unroutable { .. }));

        assert_eq!(
            coordinator.resume_agent(vehicle).unwrap(),
            AgentStatus::AwaitingInstruction
        );
        assert!(coordinator.blocked_nodes().is_empty());
    }

    #[test]
    fn position_reports_must_follow_clearance() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        let agent_id = coordinator
            .request_taxi(&graph, TaxiRequest::new("G1", "R1"))
            .unwrap()
            .agent_id()
            .unwrap();

        let err = coordinator.report_position(agent_id, &id("T1")).unwrap_err();
        assert!(matches!(err, TrafficError::UnexpectedPosition { .. }));

        coordinator.issue_clearances(&graph);
        let err = coordinator.report_position(agent_id, &id("T2")).unwrap_err();
        assert_eq!(
            err,
            TrafficError::UnexpectedPosition {
                agent_id,
                reported: id("T2"),
                expected: Some(id("T1")),
            }
        );
        assert_eq!(
            coordinator.report_position(AgentId(1), &id("T1")),
            Err(TrafficError::UnknownAgent(AgentId(1)))
        );
    }

    #[test]
    fn unknown_request_nodes_are_errors() {
        let graph = scenario_graph();
        let mut coordinator = TrafficCoordinator::new();
        assert_eq!(
            coordinator.request_taxi(&graph, TaxiRequest::new("G1", "Z9")),
            Err(TrafficError::UnknownNode(id("Z9")))
        );
    }
}
