//! twinfed Server
//!
//! Query server for digital-twin spatial-temporal federation.
//!
//! # Transports
//!
//! - **RPC** (default): tarpc over length-delimited JSON frames
//! - **HTTP** (`http` feature, on by default): `POST /v1/spaces`, `GET /health`
//!
//! # Example
//!
//! ```ignore
//! use twinfed_server::run_server;
//!
//! run_server(listener, engine, shutdown).await?;
//! ```

pub mod handler;
pub mod protocol;
pub mod settings;
pub mod transport;

// Re-export protocol types for client usage
pub use protocol::{Health, TwinService, TwinServiceClient};

// Re-export default transport for convenience
pub use transport::rpc::run_server;

#[cfg(feature = "http")]
pub use transport::http::{router, run_http_server};
