//! Entities attached to the composition graph: sensors, documents and images.
//!
//! Each entity records the `space` name it was discovered under. The same
//! physical sensor reachable under two spaces yields two entities that differ
//! only in `space`.

use serde::{Deserialize, Serialize};

/// A sensor wired to a device feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    /// Device feed identifier (`sensorId` in the graph). Never empty.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub x: Option<f64>,
    #[serde(default)]
    pub y: Option<f64>,
    /// Name of the node the sensor serves.
    pub space: String,
}

/// A document linked from a space or a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub space: String,
}

/// An image linked from a space or a piece of equipment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Image {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub space: String,
}

impl Document {
    /// Deduplication key: the URL when present, the node id otherwise.
    pub fn identity(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.id)
    }
}

impl Image {
    /// Deduplication key: the URL when present, the node id otherwise.
    pub fn identity(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_identity_prefers_url() {
        let mut doc = Document {
            id: "sm1".to_string(),
            name: Some("Service Manual".to_string()),
            url: Some("https://example.com/manual".to_string()),
            space: "Lounge".to_string(),
        };
        assert_eq!(doc.identity(), "https://example.com/manual");

        doc.url = None;
        assert_eq!(doc.identity(), "sm1");
    }

    #[test]
    fn test_sensor_wire_shape() {
        let sensor = Sensor {
            id: "a84041ce41845d13".to_string(),
            name: None,
            x: Some(4.44),
            y: None,
            space: "Bedroom 1".to_string(),
        };
        let json = serde_json::to_value(&sensor).unwrap();
        assert_eq!(json["id"], "a84041ce41845d13");
        assert_eq!(json["space"], "Bedroom 1");
        assert!(json["y"].is_null());
        assert!(json.get("name").is_none());
    }
}
