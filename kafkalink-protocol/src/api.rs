//! Request-type and compression identifiers.

use crate::error::ProtocolError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// API version sent in every request header.
pub const API_VERSION: i16 = 0;

/// Request kinds understood by the broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum ApiKey {
    Produce = 0,
    Fetch = 1,
    Offset = 2,
    Metadata = 3,
    LeaderAndIsr = 4,
    StopReplica = 5,
    OffsetCommit = 6,
    OffsetFetch = 7,
}

impl ApiKey {
    pub const ALL: [ApiKey; 8] = [
        ApiKey::Produce,
        ApiKey::Fetch,
        ApiKey::Offset,
        ApiKey::Metadata,
        ApiKey::LeaderAndIsr,
        ApiKey::StopReplica,
        ApiKey::OffsetCommit,
        ApiKey::OffsetFetch,
    ];

    pub const fn key(self) -> i16 {
        self as i16
    }

    /// Request name as used in logs and the CLI.
    pub fn name(self) -> &'static str {
        match self {
            ApiKey::Produce => "produce",
            ApiKey::Fetch => "fetch",
            ApiKey::Offset => "offset",
            ApiKey::Metadata => "metadata",
            ApiKey::LeaderAndIsr => "leader_and_isr",
            ApiKey::StopReplica => "stop_replica",
            ApiKey::OffsetCommit => "offset_commit",
            ApiKey::OffsetFetch => "offset_fetch",
        }
    }
}

impl TryFrom<i16> for ApiKey {
    type Error = ProtocolError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        usize::try_from(value)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(ProtocolError::InvalidApiKey(value))
    }
}

impl From<ApiKey> for i16 {
    fn from(key: ApiKey) -> Self {
        key.key()
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Message-set compression attribute (low bits of the message attributes byte).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum Compression {
    #[default]
    None = 0x00,
    Gzip = 0x01,
    Snappy = 0x02,
}

impl Compression {
    pub const fn attribute(self) -> i8 {
        self as i8
    }
}

impl TryFrom<i8> for Compression {
    type Error = ProtocolError;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(Compression::None),
            0x01 => Ok(Compression::Gzip),
            0x02 => Ok(Compression::Snappy),
            other => Err(ProtocolError::InvalidCompression(other)),
        }
    }
}

impl From<Compression> for i8 {
    fn from(compression: Compression) -> Self {
        compression.attribute()
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Snappy => write!(f, "snappy"),
        }
    }
}
