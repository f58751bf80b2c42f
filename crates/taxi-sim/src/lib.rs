pub mod config;
pub mod layout;
pub mod loader;
pub mod loops;
pub mod sim;

pub use config::Config;
pub use loader::{load_configured_graph, load_graph_from_files, load_graph_from_str, LoadError};
pub use sim::{SimMetrics, Simulation, TickReport};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: `RUST_LOG` filter plus `default_directive`,
/// text or JSON output.
pub fn init_tracing(default_directive: &str, json: bool) -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(default_directive.parse()?))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .try_init()?;
    Ok(())
}
