//! Engine assembly from command-line inputs.

use anyhow::Context;
use std::path::Path;
use tracing::{info, warn};
use twinfed::{Config, FederationEngine, MemoryGraph, MemoryTimeSeries};

/// Load a configuration file. `.toml` files are read as TOML, anything else
/// as JSON.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;

    let config = match path.extension().and_then(|e| e.to_str()) {
        Some("toml") => Config::from_toml(&text)
            .with_context(|| format!("parsing TOML config {}", path.display()))?,
        _ => Config::from_json(&text)
            .with_context(|| format!("parsing JSON config {}", path.display()))?,
    };

    info!(
        "Loaded config {} (max_depth={}, max_concurrency={}, timeout={}ms)",
        path.display(),
        config.max_depth,
        config.max_concurrency,
        config.request_timeout_ms
    );
    Ok(config)
}

/// Build the engine. Stores without a fixture start empty.
pub fn build_engine(
    config: Config,
    graph: Option<&Path>,
    measurements: Option<&Path>,
) -> anyhow::Result<FederationEngine> {
    let mut builder = FederationEngine::builder().config(config);

    builder = match graph {
        Some(path) => builder.graph_fixture(path),
        None => {
            warn!("No graph fixture given; every space resolves empty");
            builder.graph(MemoryGraph::new())
        }
    };

    builder = match measurements {
        Some(path) => builder.measurement_fixture(path),
        None => {
            warn!("No measurement fixture given; sensors report no values");
            builder.time_series(MemoryTimeSeries::new())
        }
    };

    Ok(builder.build()?)
}
