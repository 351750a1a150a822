//! # kafkalink-protocol
//!
//! Wire constants for the Kafka 0.8 broker protocol.
//!
//! This crate provides:
//! - Request-type identifiers (API keys) and the API version
//! - Message-set compression attributes
//! - Broker error codes and their descriptions

pub mod api;
pub mod error;

pub use api::{ApiKey, Compression, API_VERSION};
pub use error::{
    error_string, ErrorCode, ProtocolError, ERROR_CODE_MAX, ERROR_CODE_MIN, INVALID_ERROR_CODE,
    UNEXPECTED_SERVER_ERROR,
};

/// Default broker port.
pub const DEFAULT_PORT: u16 = 9092;
