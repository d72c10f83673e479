//! The federation pipeline: validation, graph traversal, measurement fetch and
//! aggregation.

pub mod aggregate;
pub mod fetch;
pub mod traversal;
pub mod validation;

pub use aggregate::aggregate;
pub use fetch::{FetchOptions, FetchOutcome, MeasurementFetcher};
pub use traversal::{GraphResolver, ResolvedSet, TraversalOptions, TraversalStats};
pub use validation::{TimeWindow, ValidatedQuery, parse_iso_millis, parse_window, validate_query};
