//! # kafkalink-client
//!
//! Blocking TCP transport for talking to a Kafka 0.8 broker.
//!
//! This crate provides:
//! - A [`Connection`] owning one socket from resolution to close
//! - Bounded-time connection establishment
//! - Complete-transfer reads and writes
//! - One interface over the Unix and Windows socket APIs

pub mod connection;
pub mod error;
pub mod platform;

pub use connection::{Connection, ConnectionConfig, ConnectionState, DEFAULT_CONNECT_TIMEOUT};
pub use error::ClientError;
pub use platform::{RawHandle, INVALID_HANDLE};
