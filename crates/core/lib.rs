//! Spatial-temporal federation for digital twins.
//!
//! A query names a space and a time window. The engine walks the containment
//! graph below that space, fetches every attached sensor's measurements from a
//! time-series store, and returns them grouped by space and measurement type.
//!
//! ## Stages
//! - **Validation**: ISO-8601 window parsing, required field checks
//! - **Traversal**: bounded, cycle-safe walk over `isPartOf` / `locatedIn`
//! - **Fetch**: one range query per sensor, bounded fan-out, per-sensor failures
//! - **Aggregation**: groups per space and field, units, summary statistics
//!
//! ```rust
//! use twinfed::{FederationEngine, MemoryGraph, MemoryTimeSeries};
//! use twinfed::types::graph::SpaceNode;
//! use twinfed::types::measurement::MeasurementRecord;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let graph = MemoryGraph::new();
//! graph.add_node(SpaceNode::new("h", "Building").with_property("name", "House"));
//! graph.add_node(SpaceNode::new("k", "CookingRoom").with_property("name", "Kitchen"));
//! graph.add_node(SpaceNode::new("t", "TemperatureSensor").with_property("sensorId", "t1"));
//! graph.add_edge("k", "isPartOf", "h")?;
//! graph.add_edge("t", "serves", "k")?;
//!
//! let series = MemoryTimeSeries::new();
//! series.insert_record(&MeasurementRecord::new("t1", 1_000).with_field("temperature", 21.5))?;
//!
//! let engine = FederationEngine::builder()
//!     .graph(graph)
//!     .time_series(series)
//!     .build()?;
//!
//! let response = engine
//!     .execute("House", "1970-01-01T00:00:00Z", "1970-01-01T00:01:00Z")
//!     .await?;
//! let kitchen = response.space("Kitchen").unwrap();
//! assert_eq!(kitchen.measurement("temperature").unwrap().unit, "°C");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

pub mod builder;
pub mod compute;
pub mod config;
pub mod engine;
pub mod error;
pub mod storage;

pub use twinfed_types as types;

pub use builder::FederationBuilder;
pub use config::{Config, TimeSeriesKeys};
pub use engine::FederationEngine;
pub use error::{FederationError, QueryStage, Result, StoreError};

pub use storage::{
    Edge, GraphStore, MemoryGraph, MemoryTimeSeries, RawItem, TimeSeriesStore,
    load_graph_fixture, load_measurement_fixture,
};

pub use compute::validation;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
