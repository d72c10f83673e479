//! JSON fixtures for the in-memory stores.
//!
//! Graph fixture layout:
//!
//! ```json
//! {
//!   "nodes": [{"id": "h", "kind": "Building", "properties": {"name": "House"}}],
//!   "edges": [{"from": "l1", "kind": "isPartOf", "to": "h"}]
//! }
//! ```
//!
//! Measurement fixtures are a JSON array of flat items carrying the
//! configured partition and sort keys.

use super::memory::{MemoryGraph, MemoryTimeSeries};
use super::RawItem;
use crate::config::TimeSeriesKeys;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use twinfed_types::graph::{EdgeKind, NodeId, SpaceNode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeFixture {
    pub from: NodeId,
    pub kind: EdgeKind,
    pub to: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphFixture {
    #[serde(default)]
    pub nodes: Vec<SpaceNode>,
    #[serde(default)]
    pub edges: Vec<EdgeFixture>,
}

impl GraphFixture {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a graph. Edges with an unknown endpoint are skipped with a warning.
    pub fn into_graph(self) -> MemoryGraph {
        let graph = MemoryGraph::new();
        for node in self.nodes {
            graph.add_node(node);
        }

        for edge in self.edges {
            if let Err(e) = graph.add_edge(edge.from.clone(), edge.kind.clone(), edge.to.clone()) {
                log::warn!(
                    "Skipping edge {} -[{}]-> {}: {}",
                    edge.from,
                    edge.kind,
                    edge.to,
                    e
                );
            }
        }

        graph
    }
}

/// Load a graph fixture file into a [`MemoryGraph`].
pub fn load_graph_fixture<P: AsRef<Path>>(path: P) -> Result<MemoryGraph> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let fixture: GraphFixture = serde_json::from_reader(reader)?;
    log::info!(
        "Loaded graph fixture {} ({} nodes, {} edges)",
        path.as_ref().display(),
        fixture.nodes.len(),
        fixture.edges.len()
    );
    Ok(fixture.into_graph())
}

/// Load a measurement fixture file into a [`MemoryTimeSeries`].
///
/// Items without valid join keys are skipped with a warning.
pub fn load_measurement_fixture<P: AsRef<Path>>(
    path: P,
    keys: TimeSeriesKeys,
) -> Result<MemoryTimeSeries> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let items: Vec<RawItem> = serde_json::from_reader(reader)?;

    let store = MemoryTimeSeries::with_keys(keys);
    let mut skipped = 0usize;
    for item in items {
        if let Err(e) = store.insert(item) {
            log::warn!("Skipping measurement item: {}", e);
            skipped += 1;
        }
    }

    log::info!(
        "Loaded measurement fixture {} ({} items, {} skipped)",
        path.as_ref().display(),
        store.item_count(),
        skipped
    );
    Ok(store)
}
