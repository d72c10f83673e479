//! Transport layer for the twinfed client
//!
//! Available transports:
//! - `rpc` - tarpc-based RPC (default)
//! - `http` - JSON over HTTP (requires `http` feature)

pub mod rpc;

#[cfg(feature = "http")]
pub mod http;
