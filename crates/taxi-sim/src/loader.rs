//! GeoJSON import of airfield nodes and edges.
//!
//! Nodes are Point features with `node_id` and optional `node_type`
//! properties. Edges reference their endpoints by id (`start_nodeID`,
//! `start_nodeId` or `start_node`, same for `end_`); features without ids
//! fall back to their LineString geometry, whose ends are snapped to the
//! nearest node. Longitude/latitude are projected to metres around the node
//! centroid so distances and turn angles are in a planar frame.

use crate::config::Config;
use crate::layout;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use taxi_core::{AirfieldGraph, GraphError, NodeId, NodeKind, Point};
use thiserror::Error;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Max distance between a LineString end and the node it is snapped to.
pub const SNAP_TOLERANCE_M: f64 = 5.0;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("node collection contains no usable nodes")]
    NoNodes,
    #[error(transparent)]
    Graph(#[from] GraphError),
}

#[derive(Debug, Deserialize)]
struct FeatureCollection {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    coordinates: Value,
}

struct RawNode {
    id: NodeId,
    kind: NodeKind,
    lon: f64,
    lat: f64,
}

/// Equirectangular projection around a reference point.
#[derive(Debug, Clone, Copy)]
struct Projection {
    lon0: f64,
    lat0: f64,
    cos_lat0: f64,
}

impl Projection {
    fn centered_on(nodes: &[RawNode]) -> Self {
        let n = nodes.len().max(1) as f64;
        let lon0 = nodes.iter().map(|node| node.lon).sum::<f64>() / n;
        let lat0 = nodes.iter().map(|node| node.lat).sum::<f64>() / n;
        Self {
            lon0,
            lat0,
            cos_lat0: lat0.to_radians().cos(),
        }
    }

    fn project(&self, lon: f64, lat: f64) -> Point {
        Point::new(
            (lon - self.lon0).to_radians() * self.cos_lat0 * EARTH_RADIUS_M,
            (lat - self.lat0).to_radians() * EARTH_RADIUS_M,
        )
    }
}

/// Build a graph from the text of a node and an edge FeatureCollection.
pub fn load_graph_from_str(nodes_json: &str, edges_json: &str) -> Result<AirfieldGraph, LoadError> {
    let nodes: FeatureCollection = serde_json::from_str(nodes_json)?;
    let edges: FeatureCollection = serde_json::from_str(edges_json)?;

    let raw_nodes = parse_nodes(&nodes);
    if raw_nodes.is_empty() {
        return Err(LoadError::NoNodes);
    }
    let projection = Projection::centered_on(&raw_nodes);

    let mut graph = AirfieldGraph::new();
    for node in &raw_nodes {
        graph.add_node(node.id.clone(), projection.project(node.lon, node.lat), node.kind);
    }

    let mut skipped = 0usize;
    for (index, feature) in edges.features.iter().enumerate() {
        let props = feature.properties.as_ref();
        let name = props.and_then(|p| string_prop(p, &["name", "ref"]));
        let start = props.and_then(|p| string_prop(p, &["start_nodeID", "start_nodeId", "start_node"]));
        let end = props.and_then(|p| string_prop(p, &["end_nodeID", "end_nodeId", "end_node"]));

        let (u, v) = match (start, end) {
            (Some(u), Some(v)) => (NodeId::from(u), NodeId::from(v)),
            _ => match snap_line_ends(feature, &graph, &projection) {
                Some(pair) => pair,
                None => {
                    tracing::warn!(feature = index, "Edge has no endpoints within snap tolerance");
                    skipped += 1;
                    continue;
                }
            },
        };
        graph.add_edge(u, v, name.as_deref())?;
    }

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        skipped_edges = skipped,
        "Loaded airfield from GeoJSON"
    );
    Ok(graph)
}

pub fn load_graph_from_files(nodes_path: &Path, edges_path: &Path) -> Result<AirfieldGraph, LoadError> {
    let nodes = read(nodes_path)?;
    let edges = read(edges_path)?;
    load_graph_from_str(&nodes, &edges)
}

/// GeoJSON files from the config when both are set, else the built-in
/// reference airfield.
pub fn load_configured_graph(config: &Config) -> Result<AirfieldGraph, LoadError> {
    match config.geojson_paths() {
        Some((nodes, edges)) => load_graph_from_files(&nodes, &edges),
        None => Ok(layout::reference_airfield()?),
    }
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_nodes(collection: &FeatureCollection) -> Vec<RawNode> {
    let mut nodes = Vec::with_capacity(collection.features.len());
    for (index, feature) in collection.features.iter().enumerate() {
        let Some((lon, lat)) = feature.geometry.as_ref().and_then(point_coordinates) else {
            tracing::warn!(feature = index, "Node feature without point coordinates");
            continue;
        };
        let props = feature.properties.as_ref();
        let Some(id) = props.and_then(|p| string_prop(p, &["node_id"])) else {
            tracing::warn!(feature = index, "Node feature without node_id");
            continue;
        };
        let kind = match props.and_then(|p| string_prop(p, &["node_type"])) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(node = %id, "{}, using taxiway", err);
                NodeKind::Taxiway
            }),
            None => NodeKind::Taxiway,
        };
        nodes.push(RawNode {
            id: NodeId::from(id),
            kind,
            lon,
            lat,
        });
    }
    nodes
}

/// First property among `keys` that is a non-empty string or a number.
fn string_prop(props: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match props.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lon_lat(value: &Value) -> Option<(f64, f64)> {
    let coords = value.as_array()?;
    Some((coords.first()?.as_f64()?, coords.get(1)?.as_f64()?))
}

fn point_coordinates(geometry: &Geometry) -> Option<(f64, f64)> {
    if geometry.kind != "Point" && !geometry.kind.is_empty() {
        return None;
    }
    lon_lat(&geometry.coordinates)
}

fn snap_line_ends(
    feature: &Feature,
    graph: &AirfieldGraph,
    projection: &Projection,
) -> Option<(NodeId, NodeId)> {
    let geometry = feature.geometry.as_ref()?;
    if geometry.kind != "LineString" {
        return None;
    }
    let coords = geometry.coordinates.as_array()?;
    if coords.len() < 2 {
        return None;
    }
    let (lon_a, lat_a) = lon_lat(coords.first()?)?;
    let (lon_b, lat_b) = lon_lat(coords.last()?)?;
    let u = nearest_node(graph, projection.project(lon_a, lat_a))?;
    let v = nearest_node(graph, projection.project(lon_b, lat_b))?;
    (u != v).then_some((u, v))
}

fn nearest_node(graph: &AirfieldGraph, at: Point) -> Option<NodeId> {
    graph
        .nodes()
        .map(|node| (node.position.distance_to(&at), &node.id))
        .filter(|(distance, _)| *distance <= SNAP_TOLERANCE_M)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id)| id.clone())
}
