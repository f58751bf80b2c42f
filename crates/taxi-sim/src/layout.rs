//! Built-in reference airfield: three gates on a ramp, taxiways Alpha and
//! Bravo, two crossing runways (05/23 and 12/30) and a service area.

use taxi_core::{AirfieldGraph, GraphError, NodeKind};

const NODES: &[(&str, (f64, f64), NodeKind)] = &[
    ("RAMP_CENTER", (400.0, 120.0), NodeKind::Taxiway),
    ("GATE_1", (340.0, 80.0), NodeKind::Spawn),
    ("GATE_2", (400.0, 80.0), NodeKind::Spawn),
    ("GATE_3", (460.0, 80.0), NodeKind::Spawn),
    ("ALPHA_1", (380.0, 180.0), NodeKind::Taxiway),
    ("ALPHA_2", (320.0, 260.0), NodeKind::Taxiway),
    ("ALPHA_3", (260.0, 340.0), NodeKind::Taxiway),
    ("ALPHA_4", (200.0, 420.0), NodeKind::Taxiway),
    ("ALPHA_5", (140.0, 500.0), NodeKind::Taxiway),
    ("BRAVO_1", (340.0, 340.0), NodeKind::Taxiway),
    ("BRAVO_2", (420.0, 340.0), NodeKind::Taxiway),
    ("BRAVO_3", (500.0, 340.0), NodeKind::Taxiway),
    ("HOLD_RWY23", (380.0, 300.0), NodeKind::Taxiway),
    ("HOLD_RWY12", (480.0, 300.0), NodeKind::Taxiway),
    ("RWY23_THRESH", (450.0, 250.0), NodeKind::Runway),
    ("RWY_INTERSECT", (300.0, 480.0), NodeKind::Runway),
    ("RWY23_END", (150.0, 650.0), NodeKind::Runway),
    ("RWY12_THRESH", (550.0, 250.0), NodeKind::Runway),
    ("RWY12_END", (650.0, 600.0), NodeKind::Runway),
    ("LUGGAGE_A", (250.0, 100.0), NodeKind::Taxiway),
];

const EDGES: &[(&str, &str, &str)] = &[
    ("GATE_1", "RAMP_CENTER", "RAMP"),
    ("GATE_2", "RAMP_CENTER", "RAMP"),
    ("GATE_3", "RAMP_CENTER", "RAMP"),
    ("RAMP_CENTER", "ALPHA_1", "A"),
    ("ALPHA_1", "ALPHA_2", "A"),
    ("ALPHA_2", "ALPHA_3", "A"),
    ("ALPHA_3", "ALPHA_4", "A"),
    ("ALPHA_4", "ALPHA_5", "A"),
    ("ALPHA_2", "HOLD_RWY23", "A1"),
    ("ALPHA_3", "BRAVO_1", "B"),
    ("BRAVO_1", "BRAVO_2", "B"),
    ("BRAVO_2", "BRAVO_3", "B"),
    ("BRAVO_2", "HOLD_RWY12", "B1"),
    ("HOLD_RWY23", "RWY23_THRESH", "A1"),
    ("HOLD_RWY12", "RWY12_THRESH", "B1"),
    ("RWY23_THRESH", "RWY_INTERSECT", "RWY23"),
    ("RWY_INTERSECT", "RWY23_END", "RWY23"),
    ("RWY12_THRESH", "RWY_INTERSECT", "RWY12"),
    ("RWY_INTERSECT", "RWY12_END", "RWY12"),
    ("RWY_INTERSECT", "ALPHA_4", "A2"),
    ("RWY_INTERSECT", "BRAVO_3", "B2"),
    ("GATE_1", "LUGGAGE_A", "SERVICE"),
    ("GATE_2", "LUGGAGE_A", "SERVICE"),
    ("GATE_3", "LUGGAGE_A", "SERVICE"),
    ("RAMP_CENTER", "LUGGAGE_A", "SERVICE"),
];

/// Build the reference airfield.
pub fn reference_airfield() -> Result<AirfieldGraph, GraphError> {
    let mut graph = AirfieldGraph::new();
    for (id, position, kind) in NODES {
        graph.add_node(*id, *position, *kind);
    }
    for (u, v, name) in EDGES {
        graph.add_edge(*u, *v, Some(*name))?;
    }
    Ok(graph)
}
