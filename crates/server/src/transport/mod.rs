//! Transport layer for the twinfed server
//!
//! Available transports:
//! - `rpc` - tarpc-based RPC
//! - `http` - JSON over HTTP (requires `http` feature, on by default)

pub mod rpc;

#[cfg(feature = "http")]
pub mod http;
