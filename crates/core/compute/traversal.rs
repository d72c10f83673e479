//! Containment traversal over the composition graph.
//!
//! Starting from every node named like the queried space, the resolver walks
//! containment edges from parent to children, level by level, and collects the
//! sensors, documents and images attached to each visited node.
//!
//! Termination does not depend on the graph being a forest:
//! - a visited set keyed by node id admits each node at most once
//! - a depth bound stops expansion below `max_depth`
//!
//! Sensors without a `sensorId` cannot be joined against the time-series
//! store and are dropped here.

use crate::error::{FederationError, QueryStage, Result, StoreError};
use crate::storage::{Edge, GraphStore};
use rustc_hash::FxHashSet;
use serde_json::Value;
use std::collections::BTreeSet;
use std::time::Instant;
use twinfed_types::entity::{Document, Image, Sensor};
use twinfed_types::graph::{EdgeKind, NodeId, SpaceNode};

/// Traversal parameters.
#[derive(Debug, Clone)]
pub struct TraversalOptions {
    pub max_depth: usize,
    pub containment_edges: Vec<EdgeKind>,
    pub deadline: Option<Instant>,
}

impl Default for TraversalOptions {
    fn default() -> Self {
        Self {
            max_depth: 64,
            containment_edges: vec![EdgeKind::IsPartOf, EdgeKind::LocatedIn],
            deadline: None,
        }
    }
}

/// Counters describing one traversal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraversalStats {
    pub start_nodes: usize,
    pub nodes_visited: usize,
    pub deepest_level: usize,
    pub depth_limited: bool,
    pub skipped_edges: usize,
    pub unwired_sensors: usize,
}

/// Output of the traversal stage.
///
/// Every entity carries the space it was discovered under. Entities are unique
/// per `(space, identifier)`; the same sensor may appear once per space.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSet {
    pub sensors: Vec<Sensor>,
    pub documents: Vec<Document>,
    pub images: Vec<Image>,
    pub space_names_visited: BTreeSet<String>,
    pub stats: TraversalStats,
}

impl ResolvedSet {
    /// True when nothing is attached anywhere below the queried space.
    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty() && self.documents.is_empty() && self.images.is_empty()
    }

    /// Distinct sensor ids, sorted. This is the fetch set.
    pub fn sensor_ids(&self) -> Vec<String> {
        let ids: BTreeSet<&str> = self.sensors.iter().map(|s| s.id.as_str()).collect();
        ids.into_iter().map(str::to_string).collect()
    }
}

/// Frontier-based resolver bound to a graph store.
pub struct GraphResolver<'a> {
    graph: &'a dyn GraphStore,
    options: TraversalOptions,
}

impl<'a> GraphResolver<'a> {
    pub fn new(graph: &'a dyn GraphStore, options: TraversalOptions) -> Self {
        Self { graph, options }
    }

    /// Resolve everything contained in the space(s) named `space_name`.
    ///
    /// An unknown space yields an empty set. Store outages are fatal; a single
    /// malformed edge is skipped with a warning.
    pub fn resolve(&self, space_name: &str) -> Result<ResolvedSet> {
        let start_ids = self
            .graph
            .find_nodes_by_name(space_name)
            .map_err(FederationError::GraphStoreUnavailable)?;

        let mut resolved = ResolvedSet::default();
        if start_ids.is_empty() {
            log::debug!("No node named '{}'", space_name);
            return Ok(resolved);
        }
        resolved.stats.start_nodes = start_ids.len();

        let mut collector = Collector::default();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut frontier: Vec<(NodeId, Option<String>)> = Vec::new();
        for id in start_ids {
            if visited.insert(id.clone()) {
                frontier.push((id, Some(space_name.to_string())));
            }
        }

        let mut depth = 0usize;
        while !frontier.is_empty() {
            self.check_deadline()?;
            resolved.stats.deepest_level = depth;

            let mut next = Vec::new();
            for (id, name) in frontier {
                resolved.stats.nodes_visited += 1;

                if let Some(name) = name.as_deref() {
                    resolved.space_names_visited.insert(name.to_string());
                    self.collect_attachments(&id, name, &mut collector, &mut resolved.stats)?;
                } else {
                    log::debug!("Node {} has no name; attachments not grouped", id);
                }

                if depth >= self.options.max_depth {
                    let below =
                        self.expand(&id, Direction::Incoming, &self.options.containment_edges)?;
                    if below
                        .iter()
                        .any(|edge| self.options.containment_edges.contains(&edge.kind))
                    {
                        resolved.stats.depth_limited = true;
                    }
                    continue;
                }

                let children =
                    self.expand(&id, Direction::Incoming, &self.options.containment_edges)?;
                for edge in children {
                    if !self.options.containment_edges.contains(&edge.kind) {
                        log::warn!(
                            "Skipping edge {} -[{}]-> {}: not a containment edge",
                            edge.node.id,
                            edge.kind,
                            id
                        );
                        resolved.stats.skipped_edges += 1;
                        continue;
                    }
                    if edge.node.id.as_str().is_empty() {
                        log::warn!("Skipping containment edge into {} with empty child id", id);
                        resolved.stats.skipped_edges += 1;
                        continue;
                    }
                    if visited.insert(edge.node.id.clone()) {
                        let child_name = edge.node.name().map(str::to_string);
                        next.push((edge.node.id, child_name));
                    }
                }
            }

            frontier = next;
            depth += 1;
        }

        if resolved.stats.depth_limited {
            log::warn!(
                "Traversal of '{}' stopped at depth bound {}",
                space_name,
                self.options.max_depth
            );
        }

        resolved.sensors = collector.sensors;
        resolved.documents = collector.documents;
        resolved.images = collector.images;
        Ok(resolved)
    }

    fn collect_attachments(
        &self,
        id: &NodeId,
        space: &str,
        collector: &mut Collector,
        stats: &mut TraversalStats,
    ) -> Result<()> {
        for edge in self.expand(id, Direction::Incoming, &[EdgeKind::Serves])? {
            if edge.kind != EdgeKind::Serves {
                stats.skipped_edges += 1;
                continue;
            }
            match sensor_from_node(&edge.node, space) {
                Ok(Some(sensor)) => collector.add_sensor(sensor),
                Ok(None) => {
                    log::debug!("Sensor node {} has no sensorId; excluded", edge.node.id);
                    stats.unwired_sensors += 1;
                }
                Err(reason) => {
                    log::warn!("Skipping serves edge {} -> {}: {}", edge.node.id, id, reason);
                    stats.skipped_edges += 1;
                }
            }
        }

        for edge in self.expand(id, Direction::Outgoing, &[EdgeKind::HasDocument])? {
            if edge.kind != EdgeKind::HasDocument {
                stats.skipped_edges += 1;
                continue;
            }
            collector.add_document(Document {
                id: edge.node.id.to_string(),
                name: edge.node.name().map(str::to_string),
                url: edge.node.str_property("url").map(str::to_string),
                space: space.to_string(),
            });
        }

        for edge in self.expand(id, Direction::Outgoing, &[EdgeKind::HasImage])? {
            if edge.kind != EdgeKind::HasImage {
                stats.skipped_edges += 1;
                continue;
            }
            collector.add_image(Image {
                id: edge.node.id.to_string(),
                name: edge.node.name().map(str::to_string),
                url: edge.node.str_property("url").map(str::to_string),
                space: space.to_string(),
            });
        }

        Ok(())
    }

    /// Expands one node. Outages abort the request; a per-node lookup failure
    /// only drops that node's edges.
    fn expand(&self, id: &NodeId, direction: Direction, kinds: &[EdgeKind]) -> Result<Vec<Edge>> {
        let result = match direction {
            Direction::Incoming => self.graph.incoming_edges(id, kinds),
            Direction::Outgoing => self.graph.outgoing_edges(id, kinds),
        };

        match result {
            Ok(edges) => Ok(edges),
            Err(e @ (StoreError::Unavailable(_) | StoreError::Timeout(_))) => {
                Err(FederationError::GraphStoreUnavailable(e))
            }
            Err(e) => {
                log::warn!("Skipping edges of node {}: {}", id, e);
                Ok(Vec::new())
            }
        }
    }

    fn check_deadline(&self) -> Result<()> {
        match self.options.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(FederationError::DeadlineExceeded {
                stage: QueryStage::ResolvingGraph,
            }),
            _ => Ok(()),
        }
    }
}

#[derive(Clone, Copy)]
enum Direction {
    /// Contained children and serving sensors point at the node.
    Incoming,
    /// Documents and images hang off the node.
    Outgoing,
}

/// Builds a sensor from a `serves` source node.
///
/// `Ok(None)` for sensors without a device feed, `Err` for malformed nodes.
fn sensor_from_node(node: &SpaceNode, space: &str) -> std::result::Result<Option<Sensor>, String> {
    let id = match node.properties.get("sensorId") {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(format!("sensorId is not a string: {}", other)),
    };

    Ok(Some(Sensor {
        id,
        name: node.name().map(str::to_string),
        x: node.f64_property("x"),
        y: node.f64_property("y"),
        space: space.to_string(),
    }))
}

/// Accumulates attachments, unique per `(space, identifier)`.
#[derive(Default)]
struct Collector {
    sensors: Vec<Sensor>,
    documents: Vec<Document>,
    images: Vec<Image>,
    seen_sensors: FxHashSet<(String, String)>,
    seen_documents: FxHashSet<(String, String)>,
    seen_images: FxHashSet<(String, String)>,
}

impl Collector {
    fn add_sensor(&mut self, sensor: Sensor) {
        if self
            .seen_sensors
            .insert((sensor.space.clone(), sensor.id.clone()))
        {
            self.sensors.push(sensor);
        }
    }

    fn add_document(&mut self, document: Document) {
        let key = (document.space.clone(), document.identity().to_string());
        if self.seen_documents.insert(key) {
            self.documents.push(document);
        }
    }

    fn add_image(&mut self, image: Image) {
        let key = (image.space.clone(), image.identity().to_string());
        if self.seen_images.insert(key) {
            self.images.push(image);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryGraph;
    use std::time::Duration;

    fn node(id: &str, kind: &str, name: &str) -> SpaceNode {
        SpaceNode::new(id, kind).with_property("name", name)
    }

    fn sensor(id: &str, sensor_id: &str) -> SpaceNode {
        SpaceNode::new(id, "TemperatureSensor")
            .with_property("name", id)
            .with_property("sensorId", sensor_id)
    }

    /// House -> Level 1 -> {Bedroom 1, Kitchen}; Kitchen <- Fridge (locatedIn)
    fn house() -> MemoryGraph {
        let g = MemoryGraph::new();
        g.add_node(node("h", "Building", "House"));
        g.add_node(node("l1", "Level", "Level 1"));
        g.add_node(node("br1", "Room", "Bedroom 1"));
        g.add_node(node("k", "CookingRoom", "Kitchen"));
        g.add_node(node("ref", "ElectricalEquipment", "Refrigerator"));
        g.add_node(sensor("ts1", "a84041ce41845d13"));
        g.add_node(sensor("ps4", "24e124148e423058"));
        g.add_node(SpaceNode::new("ts3", "TemperatureSensor").with_property("name", "temp_sensor_3"));
        g.add_node(
            SpaceNode::new("manual", "Document")
                .with_property("name", "Manual")
                .with_property("url", "https://example.com/fridge"),
        );
        g.add_node(SpaceNode::new("img", "Image").with_property("url", "fridge.jpg"));

        g.add_edge("l1", "isPartOf", "h").unwrap();
        g.add_edge("br1", "isPartOf", "l1").unwrap();
        g.add_edge("k", "isPartOf", "l1").unwrap();
        g.add_edge("ref", "locatedIn", "k").unwrap();
        g.add_edge("ts1", "serves", "br1").unwrap();
        g.add_edge("ts3", "serves", "br1").unwrap();
        g.add_edge("ps4", "serves", "ref").unwrap();
        g.add_edge("ref", "hasDocument", "manual").unwrap();
        g.add_edge("ref", "hasImage", "img").unwrap();
        g
    }

    fn resolve(graph: &MemoryGraph, name: &str) -> ResolvedSet {
        GraphResolver::new(graph, TraversalOptions::default())
            .resolve(name)
            .unwrap()
    }

    #[test]
    fn test_resolves_nested_spaces() {
        let graph = house();
        let resolved = resolve(&graph, "House");

        assert_eq!(
            resolved.sensor_ids(),
            vec!["24e124148e423058", "a84041ce41845d13"]
        );
        assert_eq!(resolved.documents.len(), 1);
        assert_eq!(resolved.documents[0].space, "Refrigerator");
        assert_eq!(resolved.images[0].url.as_deref(), Some("fridge.jpg"));

        let names: Vec<&str> = resolved.space_names_visited.iter().map(String::as_str).collect();
        assert_eq!(
            names,
            vec!["Bedroom 1", "House", "Kitchen", "Level 1", "Refrigerator"]
        );
        assert_eq!(resolved.stats.nodes_visited, 5);
        assert_eq!(resolved.stats.deepest_level, 3);
    }

    #[test]
    fn test_sensor_grouped_under_served_node() {
        let graph = house();
        let resolved = resolve(&graph, "Level 1");
        let ts1 = resolved
            .sensors
            .iter()
            .find(|s| s.id == "a84041ce41845d13")
            .unwrap();
        assert_eq!(ts1.space, "Bedroom 1");
        assert_eq!(ts1.name.as_deref(), Some("ts1"));
    }

    #[test]
    fn test_unwired_sensors_excluded() {
        let graph = house();
        let resolved = resolve(&graph, "Bedroom 1");
        assert_eq!(resolved.sensors.len(), 1);
        assert!(resolved.sensors.iter().all(|s| !s.id.is_empty()));
        assert_eq!(resolved.stats.unwired_sensors, 1);
    }

    #[test]
    fn test_unknown_space_is_empty() {
        let graph = house();
        let resolved = resolve(&graph, "Attic");
        assert!(resolved.is_empty());
        assert!(resolved.space_names_visited.is_empty());
        assert_eq!(resolved.stats.start_nodes, 0);
    }

    #[test]
    fn test_cycle_terminates() {
        let g = MemoryGraph::new();
        g.add_node(node("a", "Room", "A"));
        g.add_node(node("b", "Room", "B"));
        g.add_node(node("c", "Room", "C"));
        g.add_node(sensor("s", "x"));
        g.add_edge("b", "isPartOf", "a").unwrap();
        g.add_edge("c", "isPartOf", "b").unwrap();
        g.add_edge("a", "isPartOf", "c").unwrap();
        g.add_edge("s", "serves", "c").unwrap();

        let first = resolve(&g, "A");
        let second = resolve(&g, "A");
        assert_eq!(first.stats.nodes_visited, 3);
        assert_eq!(first.sensor_ids(), vec!["x"]);
        assert_eq!(first.sensors, second.sensors);
        assert!(!first.stats.depth_limited);
    }

    #[test]
    fn test_multi_parent_visited_once() {
        let g = MemoryGraph::new();
        g.add_node(node("h", "Building", "House"));
        g.add_node(node("l1", "Level", "Level 1"));
        g.add_node(node("l2", "Level", "Level 2"));
        g.add_node(node("stairs", "Room", "Stairs"));
        g.add_node(sensor("s", "x"));
        g.add_edge("l1", "isPartOf", "h").unwrap();
        g.add_edge("l2", "isPartOf", "h").unwrap();
        g.add_edge("stairs", "isPartOf", "l1").unwrap();
        g.add_edge("stairs", "locatedIn", "l2").unwrap();
        g.add_edge("s", "serves", "stairs").unwrap();

        let resolved = resolve(&g, "House");
        assert_eq!(resolved.stats.nodes_visited, 4);
        assert_eq!(resolved.sensors.len(), 1);
    }

    #[test]
    fn test_same_sensor_in_two_spaces() {
        let g = MemoryGraph::new();
        g.add_node(node("h", "Building", "House"));
        g.add_node(node("lr", "LivingRoom", "Lounge"));
        g.add_node(sensor("meter", "m1"));
        g.add_edge("lr", "isPartOf", "h").unwrap();
        g.add_edge("meter", "serves", "h").unwrap();
        g.add_edge("meter", "serves", "lr").unwrap();

        let resolved = resolve(&g, "House");
        let spaces: BTreeSet<&str> = resolved.sensors.iter().map(|s| s.space.as_str()).collect();
        assert_eq!(spaces, BTreeSet::from(["House", "Lounge"]));
        assert_eq!(resolved.sensor_ids(), vec!["m1"]);
    }

    #[test]
    fn test_depth_bound() {
        let g = MemoryGraph::new();
        for i in 0..10 {
            g.add_node(node(&format!("n{}", i), "Space", &format!("N{}", i)));
            if i > 0 {
                g.add_edge(format!("n{}", i), "isPartOf", format!("n{}", i - 1))
                    .unwrap();
            }
        }
        g.add_node(sensor("deep", "deep-sensor"));
        g.add_edge("deep", "serves", "n9").unwrap();

        let options = TraversalOptions {
            max_depth: 3,
            ..TraversalOptions::default()
        };
        let resolved = GraphResolver::new(&g, options).resolve("N0").unwrap();
        assert_eq!(resolved.stats.nodes_visited, 4);
        assert!(resolved.stats.depth_limited);
        assert!(resolved.sensors.is_empty());
    }

    #[test]
    fn test_leaf_at_depth_bound_is_not_limited() {
        let g = MemoryGraph::new();
        for i in 0..4 {
            g.add_node(node(&format!("n{}", i), "Space", &format!("N{}", i)));
            if i > 0 {
                g.add_edge(format!("n{}", i), "isPartOf", format!("n{}", i - 1))
                    .unwrap();
            }
        }
        g.add_node(sensor("leaf", "leaf-sensor"));
        g.add_edge("leaf", "serves", "n3").unwrap();

        let options = TraversalOptions {
            max_depth: 3,
            ..TraversalOptions::default()
        };
        let resolved = GraphResolver::new(&g, options).resolve("N0").unwrap();
        assert_eq!(resolved.stats.nodes_visited, 4);
        assert!(!resolved.stats.depth_limited);
        assert_eq!(resolved.sensor_ids(), vec!["leaf-sensor".to_string()]);
    }

    #[test]
    fn test_malformed_sensor_id_skipped() {
        let g = MemoryGraph::new();
        g.add_node(node("r", "Room", "Room"));
        g.add_node(
            SpaceNode::new("bad", "Sensor").with_property("sensorId", serde_json::json!({"id": 1})),
        );
        g.add_node(sensor("good", "ok"));
        g.add_edge("bad", "serves", "r").unwrap();
        g.add_edge("good", "serves", "r").unwrap();

        let resolved = resolve(&g, "Room");
        assert_eq!(resolved.sensor_ids(), vec!["ok"]);
        assert_eq!(resolved.stats.skipped_edges, 1);
    }

    #[test]
    fn test_duplicate_documents_collapse_by_url() {
        let g = MemoryGraph::new();
        g.add_node(node("r", "Room", "Room"));
        g.add_node(SpaceNode::new("d1", "Document").with_property("url", "same.pdf"));
        g.add_node(SpaceNode::new("d2", "Document").with_property("url", "same.pdf"));
        g.add_edge("r", "hasDocument", "d1").unwrap();
        g.add_edge("r", "hasDocument", "d2").unwrap();

        let resolved = resolve(&g, "Room");
        assert_eq!(resolved.documents.len(), 1);
    }

    #[test]
    fn test_expired_deadline() {
        let graph = house();
        let options = TraversalOptions {
            deadline: Some(Instant::now() - Duration::from_millis(1)),
            ..TraversalOptions::default()
        };
        let err = GraphResolver::new(&graph, options)
            .resolve("House")
            .unwrap_err();
        assert!(matches!(
            err,
            FederationError::DeadlineExceeded {
                stage: QueryStage::ResolvingGraph
            }
        ));
    }

    struct DownGraph;

    impl GraphStore for DownGraph {
        fn find_nodes_by_name(&self, _: &str) -> std::result::Result<Vec<NodeId>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn outgoing_edges(
            &self,
            _: &NodeId,
            _: &[EdgeKind],
        ) -> std::result::Result<Vec<Edge>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        fn incoming_edges(
            &self,
            _: &NodeId,
            _: &[EdgeKind],
        ) -> std::result::Result<Vec<Edge>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    #[test]
    fn test_store_outage_is_fatal() {
        let err = GraphResolver::new(&DownGraph, TraversalOptions::default())
            .resolve("House")
            .unwrap_err();
        assert!(matches!(err, FederationError::GraphStoreUnavailable(_)));
        assert_eq!(err.status_code(), 500);
    }
}
