//! Error types for the graph client

use thiserror::Error;

/// Result type alias for graph operations
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur when communicating with the knowledge-graph service
#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to connect after {attempts} attempts: {last_error}")]
    ConnectionFailed { attempts: u32, last_error: String },

    #[error("Request {id} timed out")]
    Timeout { id: u64 },

    #[error("Graph service error: {message}")]
    Rpc { message: String },

    #[error("Not connected")]
    NotConnected,

    #[error("Listener stopped")]
    ListenerGone,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
