//! Engine builder
//!
//! Assembles a [`FederationEngine`] from a configuration and the two stores,
//! either given directly or loaded from JSON fixtures.

use crate::config::Config;
use crate::engine::FederationEngine;
use crate::error::{FederationError, Result};
use crate::storage::{GraphStore, TimeSeriesStore, load_graph_fixture, load_measurement_fixture};
use std::path::PathBuf;
use std::sync::Arc;

enum Source<T: ?Sized> {
    Store(Arc<T>),
    Fixture(PathBuf),
}

/// Builder for a federation engine.
pub struct FederationBuilder {
    config: Config,
    graph: Option<Source<dyn GraphStore>>,
    series: Option<Source<dyn TimeSeriesStore>>,
}

impl FederationBuilder {
    /// Create a builder with the default configuration and no stores.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            graph: None,
            series: None,
        }
    }

    /// Set the engine configuration.
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Use `graph` as the graph store.
    pub fn graph<G: GraphStore + 'static>(self, graph: G) -> Self {
        self.shared_graph(Arc::new(graph))
    }

    /// Use an already shared graph store.
    pub fn shared_graph(mut self, graph: Arc<dyn GraphStore>) -> Self {
        self.graph = Some(Source::Store(graph));
        self
    }

    /// Load the graph store from a JSON fixture at build time.
    pub fn graph_fixture<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.graph = Some(Source::Fixture(path.into()));
        self
    }

    /// Use `series` as the time-series store.
    pub fn time_series<S: TimeSeriesStore + 'static>(self, series: S) -> Self {
        self.shared_time_series(Arc::new(series))
    }

    /// Use an already shared time-series store.
    pub fn shared_time_series(mut self, series: Arc<dyn TimeSeriesStore>) -> Self {
        self.series = Some(Source::Store(series));
        self
    }

    /// Load the time-series store from a JSON fixture at build time, using the
    /// configured key names.
    pub fn measurement_fixture<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.series = Some(Source::Fixture(path.into()));
        self
    }

    /// Validate the configuration, load fixtures and build the engine.
    pub fn build(self) -> Result<FederationEngine> {
        self.config.validate().map_err(FederationError::Config)?;

        let graph: Arc<dyn GraphStore> = match self.graph {
            Some(Source::Store(graph)) => graph,
            Some(Source::Fixture(path)) => Arc::new(load_graph_fixture(path)?),
            None => return Err(FederationError::Config("no graph store configured".into())),
        };

        let series: Arc<dyn TimeSeriesStore> = match self.series {
            Some(Source::Store(series)) => series,
            Some(Source::Fixture(path)) => Arc::new(load_measurement_fixture(
                path,
                self.config.time_series.clone(),
            )?),
            None => {
                return Err(FederationError::Config(
                    "no time-series store configured".into(),
                ));
            }
        };

        Ok(FederationEngine::new(graph, series, self.config))
    }
}

impl Default for FederationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
