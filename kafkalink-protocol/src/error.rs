//! Protocol error types and the broker error-code registry.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors raised when a raw wire value does not name a known constant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid api key: {0}")]
    InvalidApiKey(i16),

    #[error("invalid compression attribute: {0:#04x}")]
    InvalidCompression(i8),

    #[error("invalid error code: {0}")]
    InvalidErrorCode(i32),
}

/// Smallest error code the broker may return.
pub const ERROR_CODE_MIN: i16 = -1;

/// Largest error code the broker may return.
pub const ERROR_CODE_MAX: i16 = 12;

/// Returned for any code outside `[ERROR_CODE_MIN, ERROR_CODE_MAX]`.
pub const INVALID_ERROR_CODE: &str = "invalid error code";

/// Returned for the `-1` sentinel.
pub const UNEXPECTED_SERVER_ERROR: &str = "unexpected server error";

/// Descriptions for codes `0..=ERROR_CODE_MAX`, indexed by code.
const DESCRIPTIONS: [&str; ERROR_CODE_MAX as usize + 1] = [
    "no error",
    "offset out of range",
    "invalid message",
    "unknown topic or partition",
    "invalid message size",
    "leader not available",
    "not leader for partition",
    "request timed out",
    "broker not available",
    "replica not available",
    "message size too large",
    "stale controller epoch",
    "offset metadata too large",
];

/// Returns the description for a broker error code.
///
/// Total over every integer: codes outside the registered range map to
/// [`INVALID_ERROR_CODE`] and `-1` maps to [`UNEXPECTED_SERVER_ERROR`].
pub fn error_string(code: i32) -> &'static str {
    if code < ERROR_CODE_MIN as i32 || code > ERROR_CODE_MAX as i32 {
        return INVALID_ERROR_CODE;
    }
    if code == ErrorCode::Unknown.code() as i32 {
        return UNEXPECTED_SERVER_ERROR;
    }
    DESCRIPTIONS[code as usize]
}

/// Error codes returned by the broker in response payloads.
///
/// The numeric values are part of the wire protocol and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum ErrorCode {
    Unknown = -1,
    NoError = 0,

    // Offset and message errors
    OffsetOutOfRange = 1,
    InvalidMessage = 2,
    UnknownTopicOrPartition = 3,
    InvalidMessageSize = 4,

    // Cluster availability errors
    LeaderNotAvailable = 5,
    NotLeaderForPartition = 6,
    RequestTimedOut = 7,
    BrokerNotAvailable = 8,
    ReplicaNotAvailable = 9,

    // Limits and controller errors
    MessageSizeTooLarge = 10,
    StaleControllerEpoch = 11,
    OffsetMetadataTooLarge = 12,
}

impl ErrorCode {
    /// Every registered code, in ascending numeric order.
    pub const ALL: [ErrorCode; 14] = [
        ErrorCode::Unknown,
        ErrorCode::NoError,
        ErrorCode::OffsetOutOfRange,
        ErrorCode::InvalidMessage,
        ErrorCode::UnknownTopicOrPartition,
        ErrorCode::InvalidMessageSize,
        ErrorCode::LeaderNotAvailable,
        ErrorCode::NotLeaderForPartition,
        ErrorCode::RequestTimedOut,
        ErrorCode::BrokerNotAvailable,
        ErrorCode::ReplicaNotAvailable,
        ErrorCode::MessageSizeTooLarge,
        ErrorCode::StaleControllerEpoch,
        ErrorCode::OffsetMetadataTooLarge,
    ];

    /// Returns the wire value.
    pub const fn code(self) -> i16 {
        self as i16
    }

    /// Looks up a wire value, returning `None` for unregistered codes.
    pub fn from_code(code: i32) -> Option<Self> {
        if code < ERROR_CODE_MIN as i32 || code > ERROR_CODE_MAX as i32 {
            return None;
        }
        Some(Self::ALL[(code - ERROR_CODE_MIN as i32) as usize])
    }

    /// Human-readable description, identical to [`error_string`].
    pub fn description(self) -> &'static str {
        error_string(self.code() as i32)
    }

    /// Returns whether this error is success.
    pub fn is_ok(self) -> bool {
        self == ErrorCode::NoError
    }

    /// Returns whether a caller may reasonably retry after refreshing metadata.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            ErrorCode::LeaderNotAvailable
                | ErrorCode::NotLeaderForPartition
                | ErrorCode::RequestTimedOut
                | ErrorCode::BrokerNotAvailable
                | ErrorCode::ReplicaNotAvailable
        )
    }
}

impl TryFrom<i16> for ErrorCode {
    type Error = ProtocolError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::from_code(value as i32).ok_or(ProtocolError::InvalidErrorCode(value as i32))
    }
}

impl From<ErrorCode> for i16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_error_string_boundaries() {
        assert_eq!(error_string(-1), "unexpected server error");
        assert_eq!(error_string(0), "no error");
        assert_eq!(error_string(12), "offset metadata too large");
        assert_eq!(error_string(13), "invalid error code");
        assert_eq!(error_string(-2), "invalid error code");
        assert_eq!(error_string(i32::MIN), INVALID_ERROR_CODE);
        assert_eq!(error_string(i32::MAX), INVALID_ERROR_CODE);
    }

    #[test]
    fn test_error_string_table() {
        assert_eq!(error_string(1), "offset out of range");
        assert_eq!(error_string(2), "invalid message");
        assert_eq!(error_string(3), "unknown topic or partition");
        assert_eq!(error_string(4), "invalid message size");
        assert_eq!(error_string(5), "leader not available");
        assert_eq!(error_string(6), "not leader for partition");
        assert_eq!(error_string(7), "request timed out");
        assert_eq!(error_string(8), "broker not available");
        assert_eq!(error_string(9), "replica not available");
        assert_eq!(error_string(10), "message size too large");
        assert_eq!(error_string(11), "stale controller epoch");
    }

    #[test]
    fn test_wire_values() {
        let values: Vec<i16> = ErrorCode::ALL.iter().map(|c| c.code()).collect();
        assert_eq!(values, (-1..=12).collect::<Vec<i16>>());
        assert_eq!(ErrorCode::Unknown.code(), -1);
        assert_eq!(ErrorCode::OffsetMetadataTooLarge.code(), 12);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(ErrorCode::from_code(-1), Some(ErrorCode::Unknown));
        assert_eq!(ErrorCode::from_code(6), Some(ErrorCode::NotLeaderForPartition));
        assert_eq!(ErrorCode::from_code(13), None);
        assert_eq!(ErrorCode::from_code(-2), None);

        assert_eq!(ErrorCode::try_from(0i16), Ok(ErrorCode::NoError));
        assert_eq!(
            ErrorCode::try_from(42i16),
            Err(ProtocolError::InvalidErrorCode(42))
        );
    }

    #[test]
    fn test_error_code_retryable() {
        assert!(ErrorCode::LeaderNotAvailable.is_retryable());
        assert!(ErrorCode::NotLeaderForPartition.is_retryable());
        assert!(ErrorCode::RequestTimedOut.is_retryable());

        assert!(!ErrorCode::NoError.is_retryable());
        assert!(!ErrorCode::Unknown.is_retryable());
        assert!(!ErrorCode::MessageSizeTooLarge.is_retryable());
        assert!(!ErrorCode::OffsetOutOfRange.is_retryable());
    }

    #[test]
    fn test_error_code_display() {
        assert_eq!(format!("{}", ErrorCode::Unknown), "unexpected server error");
        assert_eq!(format!("{}", ErrorCode::NoError), "no error");
        assert_eq!(
            format!("{}", ErrorCode::StaleControllerEpoch),
            "stale controller epoch"
        );
        assert!(ErrorCode::NoError.is_ok());
        assert!(!ErrorCode::InvalidMessage.is_ok());
    }

    #[test]
    fn test_error_code_serialization() {
        let json = serde_json::to_string(&ErrorCode::UnknownTopicOrPartition).unwrap();
        assert_eq!(json, "\"UNKNOWN_TOPIC_OR_PARTITION\"");

        let parsed: ErrorCode = serde_json::from_str("\"BROKER_NOT_AVAILABLE\"").unwrap();
        assert_eq!(parsed, ErrorCode::BrokerNotAvailable);
    }

    #[test]
    fn test_protocol_error_display() {
        assert!(ProtocolError::InvalidApiKey(99).to_string().contains("99"));
        assert!(ProtocolError::InvalidCompression(7)
            .to_string()
            .contains("0x07"));
        assert!(ProtocolError::InvalidErrorCode(-5)
            .to_string()
            .contains("-5"));
    }

    proptest! {
        #[test]
        fn error_string_is_total(code in any::<i32>()) {
            let s = error_string(code);
            match ErrorCode::from_code(code) {
                None => prop_assert_eq!(s, INVALID_ERROR_CODE),
                Some(ErrorCode::Unknown) => prop_assert_eq!(s, UNEXPECTED_SERVER_ERROR),
                Some(known) => {
                    prop_assert_eq!(s, known.description());
                    prop_assert_ne!(s, INVALID_ERROR_CODE);
                    prop_assert_ne!(s, UNEXPECTED_SERVER_ERROR);
                }
            }
        }
    }
}
