//! Knowledge-graph RPC client.
//!
//! One persistent TCP connection per client, multiplexing concurrent
//! requests over Content-Length framed JSON-RPC messages. A single
//! background listener resolves pending requests by their echoed id.

mod client;
mod error;
mod protocol;

pub use client::{ConnectionState, GraphClient, GraphClientConfig};
pub use error::{GraphError, Result};
pub use protocol::{GraphRequest, GraphResponse, RpcErrorBody};
