//! Error types for the federation engine.
//!
//! Per-item problems (one sensor, one edge) never surface here: they are
//! recorded as data by the stage that hit them. `FederationError` is reserved
//! for conditions that abort the whole request.

use std::fmt;
use thiserror::Error;
use twinfed_types::query::ErrorBody;

/// Failure reported by a store capability.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store cannot be reached at all.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The requested partition or node does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The store did not answer in time.
    #[error("store timed out: {0}")]
    Timeout(String),

    /// The store answered with data that cannot be interpreted.
    #[error("malformed data: {0}")]
    Malformed(String),
}

/// Stage of the query lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStage {
    ParsingTimeRange,
    ResolvingGraph,
    FetchingMeasurements,
    Aggregating,
    Done,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ParsingTimeRange => "PARSING_TIME_RANGE",
            Self::ResolvingGraph => "RESOLVING_GRAPH",
            Self::FetchingMeasurements => "FETCHING_MEASUREMENTS",
            Self::Aggregating => "AGGREGATING",
            Self::Done => "DONE",
        };
        f.write_str(s)
    }
}

/// Request-level error.
#[derive(Debug, Error)]
pub enum FederationError {
    /// Malformed time strings or missing required query fields.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The graph store failed; fatal for the request.
    #[error("graph store unavailable: {0}")]
    GraphStoreUnavailable(#[source] StoreError),

    /// The request deadline elapsed in a stage that cannot return partial data.
    #[error("deadline exceeded during {stage}")]
    DeadlineExceeded { stage: QueryStage },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Fixture file could not be read.
    #[error("fixture I/O error: {0}")]
    FixtureIo(#[from] std::io::Error),

    /// Fixture file could not be parsed.
    #[error("fixture format error: {0}")]
    FixtureFormat(#[from] serde_json::Error),

    /// A worker task panicked or was aborted.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FederationError {
    /// HTTP-style status for the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidInput(_) => 400,
            Self::DeadlineExceeded { .. } => 504,
            Self::GraphStoreUnavailable(_)
            | Self::Config(_)
            | Self::FixtureIo(_)
            | Self::FixtureFormat(_)
            | Self::Internal(_) => 500,
        }
    }

    /// Converts the error into the structured body returned to callers.
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.to_string(),
            status: self.status_code(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FederationError>;
