//! Plan one taxi route and print its clearances.

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::json;
use std::collections::HashSet;
use std::path::PathBuf;

use taxi_core::{
    AgentId, ClearanceSegmenter, FlightPlan, Instruction, NodeId, PathOutcome, Pathfinder,
    PlanningConstraints, Reservations,
};
use taxi_sim::{init_tracing, load_configured_graph, Config};

#[derive(Debug, Clone, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Plan a single route on the airfield
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Start node id
    start: String,

    /// Destination node id
    end: String,

    /// Nodes that may not be entered
    #[arg(long, value_delimiter = ',')]
    blocked: Vec<String>,

    /// Node GeoJSON (defaults to the built-in airfield)
    #[arg(long, requires = "edges")]
    nodes: Option<PathBuf>,

    /// Edge GeoJSON
    #[arg(long, requires = "nodes")]
    edges: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env();
    if args.nodes.is_some() {
        config.nodes_path = args.nodes.clone();
        config.edges_path = args.edges.clone();
    }
    init_tracing("taxi_sim=info", config.log_json)?;

    let graph = load_configured_graph(&config).context("failed to load airfield")?;
    let start = NodeId::from(args.start.as_str());
    let end = NodeId::from(args.end.as_str());
    for node in [&start, &end] {
        if !graph.contains(node.as_str()) {
            bail!("unknown node '{}'", node);
        }
    }

    let blocked: HashSet<NodeId> = args.blocked.iter().map(|id| NodeId::from(id.as_str())).collect();
    let constraints = PlanningConstraints::new(blocked, Reservations::new());

    let route = match Pathfinder::new(&graph).find_path(&start, &end, &constraints) {
        PathOutcome::Found(route) => route,
        PathOutcome::Unroutable { nodes_expanded } => {
            bail!("no route from {} to {} ({} states expanded)", start, end, nodes_expanded)
        }
    };

    let Some(mut plan) = FlightPlan::new(AgentId(0), route.nodes.clone()) else {
        bail!("planner returned an empty route");
    };
    let segmenter = ClearanceSegmenter::new(&graph);
    let mut clearances: Vec<(Vec<NodeId>, Instruction)> = Vec::new();
    while !plan.is_complete() {
        let chunk = segmenter.issue(&mut plan);
        let instruction = Instruction::for_chunk(&chunk, &end, &graph);
        clearances.push((chunk.nodes, instruction));
    }

    match args.format {
        OutputFormat::Text => {
            let path: Vec<&str> = route.nodes.iter().map(NodeId::as_str).collect();
            println!("Route: {}", path.join(" -> "));
            println!("Cost: {:.1} ({} states expanded)", route.cost, route.nodes_expanded);
            for (i, (nodes, instruction)) in clearances.iter().enumerate() {
                let chunk: Vec<&str> = nodes.iter().map(NodeId::as_str).collect();
                println!("  {}. [{}] {}", i + 1, chunk.join(" "), instruction);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "route": route,
                "clearances": clearances
                    .iter()
                    .map(|(nodes, instruction)| json!({
                        "nodes": nodes,
                        "instruction": instruction,
                        "text": instruction.to_string(),
                    }))
                    .collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}
