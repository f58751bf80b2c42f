//! Simulation configuration from environment.

use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Wall-clock length of one tick in the async loop
    pub tick_interval_ms: u64,
    /// A spawn is attempted every this many ticks
    pub spawn_interval_ticks: u64,
    pub max_live_agents: usize,
    /// Chance per tick that a moving agent makes a technical stop
    pub stop_probability: f64,
    pub stop_duration_ticks: u64,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
    pub nodes_path: Option<PathBuf>,
    pub edges_path: Option<PathBuf>,
    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_ms: 500,
            spawn_interval_ticks: 10,
            max_live_agents: 15,
            stop_probability: 0.01,
            stop_duration_ticks: 5,
            seed: None,
            nodes_path: None,
            edges_path: None,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tick_interval_ms: env::var("TAXI_TICK_INTERVAL_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.tick_interval_ms),
            spawn_interval_ticks: env::var("TAXI_SPAWN_INTERVAL_TICKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|ticks| *ticks > 0)
                .unwrap_or(defaults.spawn_interval_ticks),
            max_live_agents: env::var("TAXI_MAX_LIVE_AGENTS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_live_agents),
            stop_probability: env::var("TAXI_STOP_PROBABILITY")
                .ok()
                .and_then(|s| s.parse::<f64>().ok())
                .map(|p| p.clamp(0.0, 1.0))
                .unwrap_or(defaults.stop_probability),
            stop_duration_ticks: env::var("TAXI_STOP_DURATION_TICKS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.stop_duration_ticks),
            seed: env::var("TAXI_SEED").ok().and_then(|s| s.parse().ok()),
            nodes_path: env::var("TAXI_NODES_GEOJSON").ok().map(PathBuf::from),
            edges_path: env::var("TAXI_EDGES_GEOJSON").ok().map(PathBuf::from),
            log_json: env::var("TAXI_LOG_JSON")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.log_json),
        }
    }

    /// Node and edge files, when both are configured.
    pub fn geojson_paths(&self) -> Option<(PathBuf, PathBuf)> {
        match (&self.nodes_path, &self.edges_path) {
            (Some(nodes), Some(edges)) => Some((nodes.clone(), edges.clone())),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geojson_paths_need_both_files() {
        let mut config = Config::default();
        assert!(config.geojson_paths().is_none());
        config.nodes_path = Some(PathBuf::from("nodes.geojson"));
        assert!(config.geojson_paths().is_none());
        config.edges_path = Some(PathBuf::from("edges.geojson"));
        assert_eq!(
            config.geojson_paths(),
            Some((PathBuf::from("nodes.geojson"), PathBuf::from("edges.geojson")))
        );
    }

    #[test]
    fn defaults_are_usable() {
        let config = Config::default();
        assert!(config.tick_interval_ms > 0);
        assert!(config.spawn_interval_ticks > 0);
        assert!((0.0..=1.0).contains(&config.stop_probability));
    }
}
