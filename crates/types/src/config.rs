use serde::{Deserialize, Serialize};

/// Field names used to join time-series records back to sensors.
///
/// The time-series store is keyed by `(partition_key, sort_key)`: the
/// partition key holds the sensor identifier and the sort key holds the
/// epoch-millisecond timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeSeriesKeys {
    #[serde(default = "TimeSeriesKeys::default_partition_key")]
    pub partition_key: String,

    #[serde(default = "TimeSeriesKeys::default_sort_key")]
    pub sort_key: String,
}

impl TimeSeriesKeys {
    fn default_partition_key() -> String {
        "sensor_id".to_string()
    }

    fn default_sort_key() -> String {
        "timestamp".to_string()
    }

    pub fn new(partition_key: impl Into<String>, sort_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            sort_key: sort_key.into(),
        }
    }

    /// Returns true if `field` is one of the join keys rather than a measurement.
    pub fn is_key(&self, field: &str) -> bool {
        field == self.partition_key || field == self.sort_key
    }
}

impl Default for TimeSeriesKeys {
    fn default() -> Self {
        Self {
            partition_key: Self::default_partition_key(),
            sort_key: Self::default_sort_key(),
        }
    }
}
