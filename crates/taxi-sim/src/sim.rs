//! Headless tick-driven simulation around the traffic coordinator.
//!
//! Each tick runs, in order: spawning, clearance issuance, motion, and
//! removal of arrived agents. Motion is node stepping: a moving agent reaches
//! the next node of its clearance every tick unless it makes a technical
//! stop, in which case it stays put for a fixed number of ticks.

use crate::config::Config;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use taxi_core::{
    AgentId, AgentStatus, AirfieldGraph, ClearanceEvent, DirectedEdge, NodeId, RetiredAgent,
    SpawnOutcome, TaxiRequest, TrafficCoordinator,
};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SimMetrics {
    pub ticks: u64,
    pub spawned: u64,
    /// Spawn attempts rejected because no route existed at the time
    pub unroutable: u64,
    pub arrivals: u64,
    pub technical_stops: u64,
    pub peak_live_agents: usize,
    /// Sum of spawn-to-removal ticks over arrived agents
    pub total_taxi_ticks: u64,
}

impl SimMetrics {
    pub fn mean_taxi_ticks(&self) -> Option<f64> {
        (self.arrivals > 0).then(|| self.total_taxi_ticks as f64 / self.arrivals as f64)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub spawned: Option<AgentId>,
    pub clearances: Vec<ClearanceEvent>,
    /// Node-to-node moves completed this tick
    pub moves: usize,
    pub arrived: Vec<AgentId>,
}

pub struct Simulation {
    graph: AirfieldGraph,
    coordinator: TrafficCoordinator,
    config: Config,
    rng: StdRng,
    tick: u64,
    spawned_at: HashMap<AgentId, u64>,
    /// Agents in a technical stop and the tick they resume on
    stopped_until: HashMap<AgentId, u64>,
    metrics: SimMetrics,
}

impl Simulation {
    pub fn new(graph: AirfieldGraph, config: Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            graph,
            coordinator: TrafficCoordinator::new(),
            config,
            rng,
            tick: 0,
            spawned_at: HashMap::new(),
            stopped_until: HashMap::new(),
            metrics: SimMetrics::default(),
        }
    }

    pub fn graph(&self) -> &AirfieldGraph {
        &self.graph
    }

    pub fn coordinator(&self) -> &TrafficCoordinator {
        &self.coordinator
    }

    pub fn metrics(&self) -> &SimMetrics {
        &self.metrics
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Advance the simulation by one tick.
    pub fn step(&mut self) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        if (self.tick - 1) % self.config.spawn_interval_ticks.max(1) == 0 {
            report.spawned = self.try_spawn();
        }

        self.resume_due_agents();
        report.clearances = self.coordinator.issue_clearances(&self.graph);
        report.moves = self.move_agents();

        for RetiredAgent { agent, transcript } in self.coordinator.remove_arrived() {
            let taxi_ticks = self
                .spawned_at
                .remove(&agent.id)
                .map(|spawned| self.tick - spawned)
                .unwrap_or(0);
            self.metrics.arrivals += 1;
            self.metrics.total_taxi_ticks += taxi_ticks;
            tracing::info!(
                agent_id = %agent.id,
                node = %agent.current_node(),
                taxi_ticks,
                transmissions = transcript.len(),
                "Agent removed after arrival"
            );
            report.arrived.push(agent.id);
        }

        self.metrics.ticks = self.tick;
        self.metrics.peak_live_agents = self
            .metrics
            .peak_live_agents
            .max(self.coordinator.live_count());
        report
    }

    /// Pick a random arrival (runway to gate) or departure (gate to runway)
    /// and ask the coordinator for a route.
    fn try_spawn(&mut self) -> Option<AgentId> {
        if self.coordinator.live_count() >= self.config.max_live_agents {
            return None;
        }
        let gates = self.graph.spawn_nodes();
        let runways: Vec<NodeId> = self.graph.runway_nodes().iter().cloned().collect();
        let gate = gates.choose(&mut self.rng)?.clone();
        let runway = runways.choose(&mut self.rng)?.clone();

        let is_arrival = self.rng.random_bool(0.5);
        let request = if is_arrival {
            TaxiRequest::new(runway, gate).arrival()
        } else {
            TaxiRequest::new(gate, runway)
        };

        match self.coordinator.request_taxi(&self.graph, request) {
            Ok(SpawnOutcome::Planned { agent_id, route }) => {
                self.metrics.spawned += 1;
                self.spawned_at.insert(agent_id, self.tick);
                tracing::debug!(agent_id = %agent_id, nodes = route.nodes.len(), is_arrival, "Spawned");
                Some(agent_id)
            }
            Ok(SpawnOutcome::Unroutable { nodes_expanded }) => {
                self.metrics.unroutable += 1;
                tracing::debug!(nodes_expanded, "Spawn skipped, no conflict-free route");
                None
            }
            Err(err) => {
                tracing::warn!("Spawn request rejected: {}", err);
                None
            }
        }
    }

    fn resume_due_agents(&mut self) {
        let due: Vec<AgentId> = self
            .stopped_until
            .iter()
            .filter(|(_, until)| **until <= self.tick)
            .map(|(agent_id, _)| *agent_id)
            .collect();
        for agent_id in due {
            self.stopped_until.remove(&agent_id);
            if let Err(err) = self.coordinator.resume_agent(agent_id) {
                tracing::warn!(agent_id = %agent_id, "Resume failed: {}", err);
            }
        }
    }

    /// Step every moving agent one node along its clearance.
    fn move_agents(&mut self) -> usize {
        let moving: Vec<(AgentId, NodeId)> = self
            .coordinator
            .agents()
            .filter(|agent| agent.status() == AgentStatus::Moving)
            .filter_map(|agent| agent.target_node().map(|node| (agent.id, node.clone())))
            .collect();

        let mut moves = 0;
        for (agent_id, target) in moving {
            if self.config.stop_probability > 0.0
                && self.rng.random_bool(self.config.stop_probability.min(1.0))
            {
                if self.coordinator.stop_agent(agent_id).is_ok() {
                    self.metrics.technical_stops += 1;
                    self.stopped_until
                        .insert(agent_id, self.tick + self.config.stop_duration_ticks);
                }
                continue;
            }
            match self.coordinator.report_position(agent_id, &target) {
                Ok(_) => moves += 1,
                Err(err) => tracing::warn!(agent_id = %agent_id, "Position report rejected: {}", err),
            }
        }
        moves
    }

    /// Pairs of live agents whose projected routes drive the same edge in
    /// opposite directions. Always empty while reservations are honoured.
    pub fn head_on_conflicts(&self) -> Vec<(AgentId, AgentId)> {
        let routes: Vec<(AgentId, HashSet<DirectedEdge>)> = self
            .coordinator
            .agents()
            .map(|agent| {
                let edges = agent
                    .projected_route()
                    .windows(2)
                    .map(|pair| DirectedEdge::new(pair[0].clone(), pair[1].clone()))
                    .collect();
                (agent.id, edges)
            })
            .collect();

        let mut conflicts = Vec::new();
        for (i, (a, a_edges)) in routes.iter().enumerate() {
            for (b, b_edges) in &routes[i + 1..] {
                if a_edges.iter().any(|edge| b_edges.contains(&edge.reversed())) {
                    conflicts.push((*a, *b));
                }
            }
        }
        conflicts
    }
}
