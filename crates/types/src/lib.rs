//! # twinfed-types
//!
//! Core types for the twinfed digital-twin federation service.
//!
//! This crate provides the data model shared by the federation engine, the
//! server and the client:
//!
//! - **Graph types**: `NodeId`, `NodeKind`, `EdgeKind`, `SpaceNode`
//! - **Attached entities**: `Sensor`, `Document`, `Image`
//! - **Measurements**: `MeasurementRecord`, `Measurement`, `MeasurementGroup`, `MeasurementSummary`
//! - **Query envelope**: `SpaceQuery`, `SpaceResult`, `QueryResponse`, `SensorFailure`, `ErrorBody`
//!
//! All types are serializable with Serde. Wire names use camelCase to match
//! the query surface consumed by dashboards.
//!
//! ## Examples
//!
//! ```rust
//! use twinfed_types::graph::{EdgeKind, NodeKind};
//! use twinfed_types::measurement::unit_for;
//!
//! assert_eq!(NodeKind::from("Room"), NodeKind::Room);
//! assert_eq!(EdgeKind::from("isPartOf"), EdgeKind::IsPartOf);
//! assert_eq!(unit_for("Temperature"), "°C");
//! ```

pub mod config;
pub mod entity;
pub mod graph;
pub mod measurement;
pub mod query;
