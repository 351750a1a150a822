//! Client error types.

use std::io;
use thiserror::Error;

/// Transport errors raised by a [`Connection`](crate::Connection).
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("no addresses found for {host}:{port}")]
    NoAddresses { host: String, port: u16 },

    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),

    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("connect to {addr} timed out after {timeout:?}")]
    ConnectTimeout {
        addr: std::net::SocketAddr,
        timeout: std::time::Duration,
    },

    #[error("not connected")]
    NotConnected,

    #[error("short read: got {read} of {expected} bytes")]
    ShortRead {
        read: usize,
        expected: usize,
        /// `None` when the peer closed the connection in an orderly way.
        #[source]
        source: Option<io::Error>,
    },

    #[error("short write: sent {written} of {expected} bytes")]
    ShortWrite {
        written: usize,
        expected: usize,
        #[source]
        source: Option<io::Error>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ClientError {
    /// Returns whether reopening the connection and retrying may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Connect { .. } => true,
            ClientError::ConnectTimeout { .. } => true,
            ClientError::ShortRead { .. } => true,
            ClientError::ShortWrite { .. } => true,
            ClientError::Io(_) => true,
            _ => false,
        }
    }

    /// Bytes transferred before a short read or write failed.
    pub fn transferred(&self) -> Option<usize> {
        match self {
            ClientError::ShortRead { read, .. } => Some(*read),
            ClientError::ShortWrite { written, .. } => Some(*written),
            _ => None,
        }
    }

    /// Returns whether the peer closed the connection during a read.
    pub fn is_peer_closed(&self) -> bool {
        matches!(self, ClientError::ShortRead { source: None, .. })
    }
}
