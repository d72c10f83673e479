//! Composition graph types.
//!
//! Node and edge kinds are open tags: the well-known labels of the building
//! ontology get their own variants, anything else round-trips through
//! `Other` unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Stable identifier of a graph node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Label of a node in the composition graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    Land,
    Building,
    Level,
    Room,
    Garage,
    RoofLevel,
    LivingRoom,
    CookingRoom,
    Space,
    Equipment,
    Sensor,
    Document,
    Image,
    Other(String),
}

impl NodeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Land => "Land",
            Self::Building => "Building",
            Self::Level => "Level",
            Self::Room => "Room",
            Self::Garage => "Garage",
            Self::RoofLevel => "RoofLevel",
            Self::LivingRoom => "LivingRoom",
            Self::CookingRoom => "CookingRoom",
            Self::Space => "Space",
            Self::Equipment => "Equipment",
            Self::Sensor => "Sensor",
            Self::Document => "Document",
            Self::Image => "Image",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for NodeKind {
    fn from(label: &str) -> Self {
        match label {
            "Land" => Self::Land,
            "Building" => Self::Building,
            "Level" => Self::Level,
            "Room" => Self::Room,
            "Garage" => Self::Garage,
            "RoofLevel" => Self::RoofLevel,
            "LivingRoom" => Self::LivingRoom,
            "CookingRoom" => Self::CookingRoom,
            "Space" => Self::Space,
            "Equipment" => Self::Equipment,
            "Sensor" => Self::Sensor,
            "Document" => Self::Document,
            "Image" => Self::Image,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeKind {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship kind between two graph nodes.
///
/// Direction conventions:
/// - `IsPartOf` / `LocatedIn`: child -> containing parent
/// - `Serves`: sensor -> served node
/// - `HasDocument` / `HasImage`: node -> artifact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EdgeKind {
    IsPartOf,
    LocatedIn,
    Serves,
    HasDocument,
    HasImage,
    Other(String),
}

impl EdgeKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::IsPartOf => "isPartOf",
            Self::LocatedIn => "locatedIn",
            Self::Serves => "serves",
            Self::HasDocument => "hasDocument",
            Self::HasImage => "hasImage",
            Self::Other(label) => label,
        }
    }
}

impl From<&str> for EdgeKind {
    fn from(label: &str) -> Self {
        match label {
            "isPartOf" => Self::IsPartOf,
            "locatedIn" => Self::LocatedIn,
            "serves" => Self::Serves,
            "hasDocument" => Self::HasDocument,
            "hasImage" => Self::HasImage,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for EdgeKind {
    fn from(label: String) -> Self {
        Self::from(label.as_str())
    }
}

impl From<EdgeKind> for String {
    fn from(kind: EdgeKind) -> Self {
        match kind {
            EdgeKind::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the property graph: identifier, label and free-form properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpaceNode {
    pub id: NodeId,
    pub kind: NodeKind,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl SpaceNode {
    pub fn new(id: impl Into<NodeId>, kind: impl Into<NodeKind>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            properties: Map::new(),
        }
    }

    /// Builder-style property setter.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Human label. Unique among siblings, not across the graph.
    pub fn name(&self) -> Option<&str> {
        self.str_property("name")
    }

    /// String property, treating empty strings as absent.
    pub fn str_property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Numeric property. Numeric strings are accepted.
    pub fn f64_property(&self, key: &str) -> Option<f64> {
        let value = match self.properties.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        value.filter(|f| f.is_finite())
    }
}
