//! twinfed Client
//!
//! Native Rust client for the twinfed query server.
//!
//! # Transports
//!
//! - **RPC** (default): tarpc-based transport
//! - **HTTP** (optional): JSON API client, enable with `http` feature
//!
//! # Example
//!
//! ```ignore
//! use twinfed_client::TwinClient;
//!
//! let client = TwinClient::connect(addr).await?;
//! let response = client.spaces("House", "2025-06-15", "2025-06-16").await?;
//! ```

pub mod transport;

// Re-export the default (RPC) client for convenience
pub use transport::rpc::{ClientError, Result, TwinClient};

#[cfg(feature = "http")]
pub use transport::http::{HttpClientError, TwinHttpClient};

pub use twinfed_server::Health;
pub use twinfed_types::query::{ErrorBody, QueryResponse, SpaceQuery};
