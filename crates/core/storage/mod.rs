//! Store capabilities consumed by the federation engine
//!
//! The engine never talks to a concrete database product. It is written
//! against two read-only capabilities:
//!
//! - [`GraphStore`]: name lookup and typed edge expansion over a property graph
//! - [`TimeSeriesStore`]: inclusive range scans over `(partition key, sort key)`
//!
//! In-memory implementations are provided for tests, demos and fixtures.

use crate::error::StoreError;
use serde_json::{Map, Value};
use twinfed_types::graph::{EdgeKind, NodeId, SpaceNode};

mod fixture;
mod memory;

pub use fixture::{EdgeFixture, GraphFixture, load_graph_fixture, load_measurement_fixture};
pub use memory::{MemoryGraph, MemoryTimeSeries};
pub(crate) use memory::sort_key_value;

/// An edge as seen from the node it was expanded from.
///
/// `node` is the far endpoint: the target for outgoing edges, the source for
/// incoming edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub kind: EdgeKind,
    pub node: SpaceNode,
}

/// Read-only property graph capability.
pub trait GraphStore: Send + Sync {
    /// Ids of every node whose `name` property equals `name`.
    fn find_nodes_by_name(&self, name: &str) -> Result<Vec<NodeId>, StoreError>;

    /// Edges leaving `node` whose kind is one of `kinds`.
    fn outgoing_edges(&self, node: &NodeId, kinds: &[EdgeKind]) -> Result<Vec<Edge>, StoreError>;

    /// Edges arriving at `node` whose kind is one of `kinds`.
    fn incoming_edges(&self, node: &NodeId, kinds: &[EdgeKind]) -> Result<Vec<Edge>, StoreError>;
}

/// A flat time-series item: field name to value, join keys included.
pub type RawItem = Map<String, Value>;

/// Read-only range-keyed time-series capability.
pub trait TimeSeriesStore: Send + Sync {
    /// Items of `partition_key` whose sort key lies in `[start, end]`.
    fn range_query(
        &self,
        partition_key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<RawItem>, StoreError>;
}
