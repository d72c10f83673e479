//! Query surface types.

use crate::entity::{Document, Image, Sensor};
use crate::measurement::MeasurementGroup;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A spatial-temporal query as received from a caller.
///
/// Fields are optional on the wire so that a request with missing fields is
/// reported as a client input error instead of a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceQuery {
    #[serde(default)]
    pub space: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl SpaceQuery {
    pub fn new(
        space: impl Into<String>,
        start_date: impl Into<String>,
        end_date: impl Into<String>,
    ) -> Self {
        Self {
            space: Some(space.into()),
            start_date: Some(start_date.into()),
            end_date: Some(end_date.into()),
        }
    }
}

/// Everything known about one space for the queried window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpaceResult {
    pub name: String,
    pub sensors: Vec<Sensor>,
    pub documents: Vec<Document>,
    pub images: Vec<Image>,
    pub measurements: Vec<MeasurementGroup>,
}

impl SpaceResult {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sensors: Vec::new(),
            documents: Vec::new(),
            images: Vec::new(),
            measurements: Vec::new(),
        }
    }

    pub fn measurement(&self, name: &str) -> Option<&MeasurementGroup> {
        self.measurements.iter().find(|g| g.name == name)
    }
}

/// Why a per-sensor range query produced no (or partial) data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Timeout,
    NotFound,
    MalformedItem,
    Unavailable,
    Internal,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Timeout => "timeout",
            Self::NotFound => "not_found",
            Self::MalformedItem => "malformed_item",
            Self::Unavailable => "unavailable",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

/// Non-fatal failure of one sensor's range query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorFailure {
    pub sensor_id: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Successful query response: results plus per-sensor failure metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub spaces: Vec<SpaceResult>,
    #[serde(default)]
    pub failures: Vec<SensorFailure>,
}

impl QueryResponse {
    pub fn space(&self, name: &str) -> Option<&SpaceResult> {
        self.spaces.iter().find(|s| s.name == name)
    }
}

/// Structured error returned to callers, with HTTP-style status semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub status: u16,
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.error, self.status)
    }
}

impl std::error::Error for ErrorBody {}
