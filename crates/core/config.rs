//! Configuration for the federation engine
//!
//! This module provides the engine configuration and re-exports the
//! time-series key layout from the `twinfed-types` crate.
use serde::de::Error;
use std::time::Duration;
use twinfed_types::graph::EdgeKind;

pub use twinfed_types::config::TimeSeriesKeys;

/// Engine configuration
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Maximum containment depth walked below the queried space
    #[serde(default = "Config::default_max_depth")]
    pub max_depth: usize,

    /// Upper bound on concurrent per-sensor range queries
    #[serde(default = "Config::default_max_concurrency")]
    pub max_concurrency: usize,

    /// Deadline for a whole request, in milliseconds
    #[serde(default = "Config::default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Edge kinds treated as containment (child -> parent)
    #[serde(default = "Config::default_containment_edges")]
    pub containment_edges: Vec<EdgeKind>,

    /// Key layout of the time-series store
    #[serde(default)]
    pub time_series: TimeSeriesKeys,
}

impl Config {
    const fn default_max_depth() -> usize {
        64
    }

    const fn default_max_concurrency() -> usize {
        16
    }

    const fn default_request_timeout_ms() -> u64 {
        30_000
    }

    fn default_containment_edges() -> Vec<EdgeKind> {
        vec![EdgeKind::IsPartOf, EdgeKind::LocatedIn]
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        assert!(depth > 0, "Max depth must be greater than zero");
        self.max_depth = depth;
        self
    }

    pub fn with_max_concurrency(mut self, concurrency: usize) -> Self {
        assert!(concurrency > 0, "Max concurrency must be greater than zero");

        if concurrency > 256 {
            log::warn!(
                "Max concurrency of {} may overload the time-series store. \
                Each worker holds one in-flight range query.",
                concurrency
            );
        }

        self.max_concurrency = concurrency;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        assert!(!timeout.is_zero(), "Request timeout must be greater than zero");
        self.request_timeout_ms = timeout.as_millis().min(u64::MAX as u128) as u64;
        self
    }

    pub fn with_containment_edges(mut self, edges: Vec<EdgeKind>) -> Self {
        self.containment_edges = edges;
        self
    }

    pub fn with_time_series_keys(mut self, keys: TimeSeriesKeys) -> Self {
        self.time_series = keys;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_depth == 0 {
            return Err("Max depth must be greater than zero".to_string());
        }

        if self.max_concurrency == 0 {
            return Err("Max concurrency must be greater than zero".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("Request timeout must be greater than zero".to_string());
        }

        if self.containment_edges.is_empty() {
            return Err("At least one containment edge kind is required".to_string());
        }

        if self.time_series.partition_key.is_empty() || self.time_series.sort_key.is_empty() {
            return Err("Time-series key names must not be empty".to_string());
        }

        if self.time_series.partition_key == self.time_series.sort_key {
            return Err("Time-series partition and sort keys must differ".to_string());
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_depth: Self::default_max_depth(),
            max_concurrency: Self::default_max_concurrency(),
            request_timeout_ms: Self::default_request_timeout_ms(),
            containment_edges: Self::default_containment_edges(),
            time_series: TimeSeriesKeys::default(),
        }
    }
}
