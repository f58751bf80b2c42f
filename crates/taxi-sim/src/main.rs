//! Taxi simulation - runs the headless airfield loop

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use taxi_sim::loops::run_sim_loop;
use taxi_sim::{init_tracing, load_configured_graph, Config, SimMetrics, Simulation};

/// Headless airfield taxi simulation
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Stop after this many ticks (runs until Ctrl-C otherwise)
    #[arg(long)]
    ticks: Option<u64>,

    /// RNG seed, overrides TAXI_SEED
    #[arg(long)]
    seed: Option<u64>,

    /// Node GeoJSON, overrides TAXI_NODES_GEOJSON
    #[arg(long, requires = "edges")]
    nodes: Option<PathBuf>,

    /// Edge GeoJSON, overrides TAXI_EDGES_GEOJSON
    #[arg(long, requires = "nodes")]
    edges: Option<PathBuf>,

    /// Tick length in milliseconds, overrides TAXI_TICK_INTERVAL_MS
    #[arg(long)]
    tick_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(tick_ms) = args.tick_ms {
        config.tick_interval_ms = tick_ms.max(1);
    }
    if args.nodes.is_some() {
        config.nodes_path = args.nodes;
        config.edges_path = args.edges;
    }

    init_tracing("taxi_sim=debug", config.log_json)?;
    tracing::info!("Starting taxi simulation...");

    let graph = load_configured_graph(&config).context("failed to load airfield")?;
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        gates = graph.spawn_nodes().len(),
        runway_nodes = graph.runway_nodes().len(),
        "Airfield ready"
    );

    let sim = Arc::new(Mutex::new(Simulation::new(graph, config.clone())));
    let started_at = chrono::Utc::now();

    let metrics = tokio::select! {
        metrics = run_sim_loop(sim.clone(), config, args.ticks) => metrics,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, shutting down");
            sim.lock().await.metrics().clone()
        }
    };

    print_summary(&metrics, started_at);
    Ok(())
}

fn print_summary(metrics: &SimMetrics, started_at: chrono::DateTime<chrono::Utc>) {
    let elapsed = chrono::Utc::now() - started_at;
    println!("\n=== Simulation summary ===");
    println!("Wall time:        {}s", elapsed.num_seconds());
    println!("Ticks:            {}", metrics.ticks);
    println!("Spawned:          {}", metrics.spawned);
    println!("Unroutable:       {}", metrics.unroutable);
    println!("Arrivals:         {}", metrics.arrivals);
    println!("Technical stops:  {}", metrics.technical_stops);
    println!("Peak live agents: {}", metrics.peak_live_agents);
    match metrics.mean_taxi_ticks() {
        Some(mean) => println!("Mean taxi ticks:  {:.1}", mean),
        None => println!("Mean taxi ticks:  n/a"),
    }
}
