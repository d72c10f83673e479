//! In-memory store implementations.

use super::{Edge, GraphStore, RawItem, TimeSeriesStore};
use crate::config::TimeSeriesKeys;
use crate::error::StoreError;
use dashmap::DashMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::BTreeMap;
use twinfed_types::graph::{EdgeKind, NodeId, SpaceNode};
use twinfed_types::measurement::MeasurementRecord;

/// In-memory property graph: node arena plus name and adjacency indexes.
pub struct MemoryGraph {
    inner: RwLock<GraphInner>,
}

#[derive(Default)]
struct GraphInner {
    nodes: FxHashMap<NodeId, SpaceNode>,
    by_name: FxHashMap<String, Vec<NodeId>>,
    outgoing: FxHashMap<NodeId, Vec<(EdgeKind, NodeId)>>,
    incoming: FxHashMap<NodeId, Vec<(EdgeKind, NodeId)>>,
    edge_count: usize,
}

impl GraphInner {
    fn expand(
        &self,
        adjacency: &FxHashMap<NodeId, Vec<(EdgeKind, NodeId)>>,
        node: &NodeId,
        kinds: &[EdgeKind],
    ) -> Vec<Edge> {
        let Some(edges) = adjacency.get(node) else {
            return Vec::new();
        };

        edges
            .iter()
            .filter(|(kind, _)| kinds.contains(kind))
            .filter_map(|(kind, other)| {
                self.nodes.get(other).map(|n| Edge {
                    kind: kind.clone(),
                    node: n.clone(),
                })
            })
            .collect()
    }
}

impl MemoryGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(GraphInner::default()),
        }
    }

    /// Insert or replace a node.
    pub fn add_node(&self, node: SpaceNode) {
        let mut guard = self.inner.write();
        let inner = &mut *guard;

        let old_name = inner
            .nodes
            .get(&node.id)
            .and_then(|old| old.name())
            .map(str::to_string);
        if let Some(old_name) = old_name
            && let Some(ids) = inner.by_name.get_mut(&old_name)
        {
            ids.retain(|id| id != &node.id);
        }

        if let Some(name) = node.name() {
            inner
                .by_name
                .entry(name.to_string())
                .or_default()
                .push(node.id.clone());
        }

        inner.nodes.insert(node.id.clone(), node);
    }

    /// Insert a directed edge `from -[kind]-> to`. Both endpoints must exist.
    pub fn add_edge(
        &self,
        from: impl Into<NodeId>,
        kind: impl Into<EdgeKind>,
        to: impl Into<NodeId>,
    ) -> Result<(), StoreError> {
        let (from, kind, to) = (from.into(), kind.into(), to.into());
        let mut inner = self.inner.write();

        for endpoint in [&from, &to] {
            if !inner.nodes.contains_key(endpoint) {
                return Err(StoreError::NotFound(format!("node {}", endpoint)));
            }
        }

        inner
            .outgoing
            .entry(from.clone())
            .or_default()
            .push((kind.clone(), to.clone()));
        inner.incoming.entry(to).or_default().push((kind, from));
        inner.edge_count += 1;

        Ok(())
    }

    pub fn node(&self, id: &NodeId) -> Option<SpaceNode> {
        self.inner.read().nodes.get(id).cloned()
    }

    pub fn node_count(&self) -> usize {
        self.inner.read().nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.read().edge_count
    }
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphStore for MemoryGraph {
    fn find_nodes_by_name(&self, name: &str) -> Result<Vec<NodeId>, StoreError> {
        Ok(self
            .inner
            .read()
            .by_name
            .get(name)
            .cloned()
            .unwrap_or_default())
    }

    fn outgoing_edges(&self, node: &NodeId, kinds: &[EdgeKind]) -> Result<Vec<Edge>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.expand(&inner.outgoing, node, kinds))
    }

    fn incoming_edges(&self, node: &NodeId, kinds: &[EdgeKind]) -> Result<Vec<Edge>, StoreError> {
        let inner = self.inner.read();
        Ok(inner.expand(&inner.incoming, node, kinds))
    }
}

/// In-memory time-series store: partition key -> sort key -> item.
///
/// Writing an item with an existing `(partition, sort)` key replaces it.
pub struct MemoryTimeSeries {
    keys: TimeSeriesKeys,
    partitions: DashMap<String, BTreeMap<i64, RawItem>>,
}

impl MemoryTimeSeries {
    pub fn new() -> Self {
        Self::with_keys(TimeSeriesKeys::default())
    }

    pub fn with_keys(keys: TimeSeriesKeys) -> Self {
        Self {
            keys,
            partitions: DashMap::new(),
        }
    }

    pub fn keys(&self) -> &TimeSeriesKeys {
        &self.keys
    }

    /// Store a raw item. The item must carry both join keys.
    pub fn insert(&self, item: RawItem) -> Result<(), StoreError> {
        let partition = match item.get(&self.keys.partition_key) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => {
                return Err(StoreError::Malformed(format!(
                    "item has no string '{}'",
                    self.keys.partition_key
                )));
            }
        };

        let sort = item
            .get(&self.keys.sort_key)
            .and_then(sort_key_value)
            .ok_or_else(|| {
                StoreError::Malformed(format!(
                    "item for '{}' has no integer '{}'",
                    partition, self.keys.sort_key
                ))
            })?;

        self.partitions
            .entry(partition)
            .or_default()
            .insert(sort, item);

        Ok(())
    }

    /// Store a typed record using the configured key names.
    pub fn insert_record(&self, record: &MeasurementRecord) -> Result<(), StoreError> {
        let mut item = RawItem::new();
        item.insert(
            self.keys.partition_key.clone(),
            Value::String(record.sensor_id.clone()),
        );
        item.insert(self.keys.sort_key.clone(), Value::from(record.timestamp));
        for (name, value) in &record.fields {
            item.insert(name.clone(), Value::from(*value));
        }
        self.insert(item)
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn item_count(&self) -> usize {
        self.partitions.iter().map(|p| p.value().len()).sum()
    }
}

impl Default for MemoryTimeSeries {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSeriesStore for MemoryTimeSeries {
    fn range_query(
        &self,
        partition_key: &str,
        start: i64,
        end: i64,
    ) -> Result<Vec<RawItem>, StoreError> {
        if start > end {
            return Ok(Vec::new());
        }

        Ok(self
            .partitions
            .get(partition_key)
            .map(|p| p.range(start..=end).map(|(_, item)| item.clone()).collect())
            .unwrap_or_default())
    }
}

/// Integer sort key from a JSON value. Numeric strings are accepted.
pub(crate) fn sort_key_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
