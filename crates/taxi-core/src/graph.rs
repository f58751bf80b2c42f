//! Static airfield topology: nodes, undirected named edges and adjacency.
//!
//! The graph is built once by a loader and is read-only afterwards, so it
//! can be shared by reference between the planner, the reservation logic and
//! the clearance segmenter.

use crate::error::GraphError;
use crate::models::{Node, NodeId, NodeKind, Point};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_EDGE_NAME: &str = "taxiway";
pub const DEFAULT_EDGE_WEIGHT: f64 = 1.0;

/// Properties stored once per unordered node pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub name: String,
    /// Base weight kept with the edge record. Step cost is the Euclidean
    /// distance between the endpoints plus penalties; it does not read this.
    pub weight: f64,
}

impl Default for Edge {
    fn default() -> Self {
        Self {
            name: DEFAULT_EDGE_NAME.to_string(),
            weight: DEFAULT_EDGE_WEIGHT,
        }
    }
}

/// Unordered pair key; the smaller id is always first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct EdgeKey(NodeId, NodeId);

impl EdgeKey {
    fn new(u: &NodeId, v: &NodeId) -> Self {
        if u <= v {
            Self(u.clone(), v.clone())
        } else {
            Self(v.clone(), u.clone())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AirfieldGraph {
    nodes: HashMap<NodeId, Node>,
    edges: HashMap<EdgeKey, Edge>,
    adjacency: HashMap<NodeId, Vec<NodeId>>,
    runway_nodes: BTreeSet<NodeId>,
}

impl AirfieldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node. Re-using an id replaces the node (last write wins)
    /// but keeps its existing edges.
    pub fn add_node(&mut self, id: impl Into<NodeId>, position: impl Into<Point>, kind: NodeKind) {
        let id = id.into();
        if kind == NodeKind::Runway {
            self.runway_nodes.insert(id.clone());
        } else {
            self.runway_nodes.remove(&id);
        }
        self.adjacency.entry(id.clone()).or_default();
        self.nodes.insert(
            id.clone(),
            Node {
                id,
                position: position.into(),
                kind,
            },
        );
    }

    /// Connect two existing nodes with an undirected edge. Both endpoints
    /// must already be present; an unknown endpoint is a configuration error
    /// and leaves the graph untouched. Re-adding a known pair only updates
    /// its name.
    pub fn add_edge(
        &mut self,
        u: impl Into<NodeId>,
        v: impl Into<NodeId>,
        name: Option<&str>,
    ) -> Result<(), GraphError> {
        let (u, v) = (u.into(), v.into());
        for endpoint in [&u, &v] {
            if !self.nodes.contains_key(endpoint) {
                return Err(GraphError::UnknownNode {
                    from: u.clone(),
                    to: v.clone(),
                    missing: endpoint.clone(),
                });
            }
        }
        if u == v {
            return Err(GraphError::SelfLoop(u));
        }

        let edge = Edge {
            name: name.unwrap_or(DEFAULT_EDGE_NAME).to_string(),
            weight: DEFAULT_EDGE_WEIGHT,
        };
        if self.edges.insert(EdgeKey::new(&u, &v), edge).is_none() {
            self.adjacency.entry(u.clone()).or_default().push(v.clone());
            self.adjacency.entry(v).or_default().push(u);
        }
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn position(&self, id: &str) -> Option<Point> {
        self.nodes.get(id).map(|node| node.position)
    }

    pub fn kind(&self, id: &str) -> Option<NodeKind> {
        self.nodes.get(id).map(|node| node.kind)
    }

    pub fn neighbors(&self, id: &str) -> &[NodeId] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of incident edges.
    pub fn degree(&self, id: &str) -> usize {
        self.neighbors(id).len()
    }

    /// Taxiway intersection: more than two incident edges.
    pub fn is_decision_node(&self, id: &str) -> bool {
        self.degree(id) > 2
    }

    pub fn edge(&self, u: &NodeId, v: &NodeId) -> Option<&Edge> {
        self.edges.get(&EdgeKey::new(u, v))
    }

    /// Stored edge name, or the generic "taxiway" when the pair has no record.
    pub fn edge_name(&self, u: &NodeId, v: &NodeId) -> &str {
        self.edge(u, v)
            .map(|edge| edge.name.as_str())
            .unwrap_or(DEFAULT_EDGE_NAME)
    }

    pub fn runway_nodes(&self) -> &BTreeSet<NodeId> {
        &self.runway_nodes
    }

    /// Gates and stands, sorted by id.
    pub fn spawn_nodes(&self) -> Vec<NodeId> {
        let mut spawns: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|node| node.kind == NodeKind::Spawn)
            .map(|node| node.id.clone())
            .collect();
        spawns.sort();
        spawns
    }

    /// Euclidean distance between two nodes; infinite if either is unknown.
    pub fn heuristic(&self, a: &str, b: &str) -> f64 {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => pa.distance_to(&pb),
            _ => f64::INFINITY,
        }
    }

    /// Deviation in degrees between p1->p2 and p2->p3, in [0, 180].
    /// 0 means straight ahead; degenerate (zero-length) segments give 0.
    pub fn turn_angle(&self, p1: &str, p2: &str, p3: &str) -> f64 {
        let (Some(a), Some(b), Some(c)) = (self.position(p1), self.position(p2), self.position(p3))
        else {
            return 0.0;
        };
        turn_angle(a, b, c)
    }
}

pub fn turn_angle(p1: Point, p2: Point, p3: Point) -> f64 {
    let (v1x, v1y) = (p2.x - p1.x, p2.y - p1.y);
    let (v2x, v2y) = (p3.x - p2.x, p3.y - p2.y);
    let mag1 = v1x.hypot(v1y);
    let mag2 = v2x.hypot(v2y);
    if mag1 == 0.0 || mag2 == 0.0 {
        return 0.0;
    }
    let cos = ((v1x * v2x + v1y * v2y) / (mag1 * mag2)).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
