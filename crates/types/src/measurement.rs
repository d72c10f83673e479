//! Time-series measurement types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A point reading retrieved from the time-series store.
///
/// `fields` holds every numeric field of the stored item except the join keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub sensor_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub fields: BTreeMap<String, f64>,
}

impl MeasurementRecord {
    pub fn new(sensor_id: impl Into<String>, timestamp: i64) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: f64) -> Self {
        self.fields.insert(name.into(), value);
        self
    }
}

/// One value of a measurement group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurement {
    pub sensor_id: String,
    pub timestamp: i64,
    pub value: f64,
}

/// Summary statistics over the values of a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
}

impl MeasurementSummary {
    /// Computes the summary of a non-empty, timestamp-ordered slice.
    pub fn from_values(values: &[Measurement]) -> Option<Self> {
        let first = values.first()?;
        let last = values.last()?;

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for m in values {
            min = min.min(m.value);
            max = max.max(m.value);
            sum += m.value;
        }

        Some(Self {
            count: values.len(),
            min,
            max,
            mean: sum / values.len() as f64,
            first_timestamp: first.timestamp,
            last_timestamp: last.timestamp,
        })
    }
}

/// All values of one measurement type within a space, ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementGroup {
    pub name: String,
    pub unit: String,
    pub values: Vec<Measurement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<MeasurementSummary>,
}

/// Unit of a measurement type. Unknown types map to `"units"`.
pub fn unit_for(measurement_type: &str) -> &'static str {
    match measurement_type.to_ascii_lowercase().as_str() {
        "temperature" => "°C",
        "humidity" => "%",
        "pressure" => "hPa",
        "co2" => "ppm",
        "power" => "W",
        "current" => "A",
        _ => "units",
    }
}
