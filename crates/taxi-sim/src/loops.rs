//! Background simulation loop.
//!
//! The simulation sits behind one mutex, so a spawn's reservation snapshot
//! and path search never interleave with another tick.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::interval;

use crate::config::Config;
use crate::sim::{SimMetrics, Simulation};

/// Run ticks on a fixed interval until `max_ticks` is reached (forever when
/// `None`). Returns the final metrics.
pub async fn run_sim_loop(
    sim: Arc<Mutex<Simulation>>,
    config: Config,
    max_ticks: Option<u64>,
) -> SimMetrics {
    let mut ticker = interval(Duration::from_millis(config.tick_interval_ms.max(1)));

    loop {
        ticker.tick().await;

        let mut sim = sim.lock().await;
        let report = sim.step();

        if !report.clearances.is_empty() || !report.arrived.is_empty() {
            tracing::debug!(
                tick = report.tick,
                clearances = report.clearances.len(),
                moves = report.moves,
                arrived = report.arrived.len(),
                live_agents = sim.coordinator().live_count(),
                "Tick"
            );
        }

        if max_ticks.is_some_and(|limit| report.tick >= limit) {
            tracing::info!(tick = report.tick, "Tick limit reached");
            return sim.metrics().clone();
        }
    }
}
