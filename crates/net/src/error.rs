/// Error types for the synchronization layer
use std::net::SocketAddr;

use thiserror::Error;

use crate::protocol::DecodeError;

/// Result type alias for network operations
pub type Result<T> = std::result::Result<T, NetError>;

/// Errors that can occur while setting up or driving a match link
#[derive(Debug, Error)]
pub enum NetError {
    /// The listening endpoint could not be created
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// The authority's host name did not resolve
    #[error("Cannot resolve host {0}")]
    Resolve(String),

    /// The background I/O runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(std::io::Error),

    /// Operation is reserved to the authority
    #[error("Not the authority")]
    NotAuthority,

    /// Malformed message payload
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
