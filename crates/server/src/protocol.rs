//! Protocol definitions for the twinfed RPC service
//!
//! The query and response types live in `twinfed-types` so the HTTP transport
//! and the clients share one wire shape.

use serde::{Deserialize, Serialize};
use twinfed_types::query::{ErrorBody, QueryResponse, SpaceQuery};

/// Liveness report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

impl Health {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[tarpc::service]
pub trait TwinService {
    /// Everything measured below `query.space` within its time window.
    async fn spaces(query: SpaceQuery) -> Result<QueryResponse, ErrorBody>;

    async fn health() -> Health;
}
