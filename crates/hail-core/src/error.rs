//! Error types for the client invocation layer.

use std::fmt;

use crate::metadata::Metadata;

/// Status codes reported by a remote peer, aligned with gRPC (0-14).
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Success (not an error)
    Ok = 0,

    // Cancellation & timeouts
    /// Operation was cancelled
    Cancelled = 1,
    /// Deadline passed before completion
    DeadlineExceeded = 2,

    // Request errors
    /// Malformed request
    InvalidArgument = 3,
    /// Service/method not found
    NotFound = 4,
    /// Resource already exists
    AlreadyExists = 5,
    /// Caller lacks permission
    PermissionDenied = 6,

    // Resource errors
    /// Out of quota, slots, connections, etc.
    ResourceExhausted = 7,
    /// System not in required state
    FailedPrecondition = 8,

    // Protocol errors
    /// Operation aborted (conflict, etc.)
    Aborted = 9,
    /// Value out of valid range
    OutOfRange = 10,
    /// Method not implemented
    Unimplemented = 11,

    // System errors
    /// Internal error (bug)
    Internal = 12,
    /// Service temporarily unavailable
    Unavailable = 13,
    /// Unrecoverable data loss
    DataLoss = 14,
}

impl ErrorCode {
    /// Convert from a u32 wire value.
    /// Returns None if the value doesn't match a known error code.
    pub fn from_u32(val: u32) -> Option<Self> {
        Some(match val {
            0 => ErrorCode::Ok,
            1 => ErrorCode::Cancelled,
            2 => ErrorCode::DeadlineExceeded,
            3 => ErrorCode::InvalidArgument,
            4 => ErrorCode::NotFound,
            5 => ErrorCode::AlreadyExists,
            6 => ErrorCode::PermissionDenied,
            7 => ErrorCode::ResourceExhausted,
            8 => ErrorCode::FailedPrecondition,
            9 => ErrorCode::Aborted,
            10 => ErrorCode::OutOfRange,
            11 => ErrorCode::Unimplemented,
            12 => ErrorCode::Internal,
            13 => ErrorCode::Unavailable,
            14 => ErrorCode::DataLoss,
            _ => return None,
        })
    }

    /// Convert to u32 for wire transmission.
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Get a human-readable description of this error code.
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::Ok => "success",
            ErrorCode::Cancelled => "operation was cancelled",
            ErrorCode::DeadlineExceeded => "deadline exceeded",
            ErrorCode::InvalidArgument => "invalid argument",
            ErrorCode::NotFound => "not found",
            ErrorCode::AlreadyExists => "already exists",
            ErrorCode::PermissionDenied => "permission denied",
            ErrorCode::ResourceExhausted => "resource exhausted",
            ErrorCode::FailedPrecondition => "failed precondition",
            ErrorCode::Aborted => "operation aborted",
            ErrorCode::OutOfRange => "out of range",
            ErrorCode::Unimplemented => "not implemented",
            ErrorCode::Internal => "internal error",
            ErrorCode::Unavailable => "service unavailable",
            ErrorCode::DataLoss => "data loss",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_u32())
    }
}

/// Error from the underlying transport.
///
/// Never reinterpreted by the invocation layer; surfaced to the caller
/// as-is inside [`RpcError::Transport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The transport was closed (locally or by the peer).
    Closed,
    /// The transport failed with the given reason.
    Failed(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "transport closed"),
            TransportError::Failed(reason) => write!(f, "transport failed: {reason}"),
        }
    }
}

impl std::error::Error for TransportError {}

/// Error producing the wire encoding of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The serialization context was never completed.
    Incomplete,
    /// The written payload length contradicts the declared length.
    LengthMismatch { declared: usize, actual: usize },
    /// The message type itself failed to encode.
    Message(String),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Incomplete => write!(f, "serialization was never completed"),
            EncodeError::LengthMismatch { declared, actual } => {
                write!(f, "declared payload length {declared} but wrote {actual}")
            }
            EncodeError::Message(reason) => write!(f, "encode failed: {reason}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Error parsing received bytes into a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The payload ended before the message did.
    Truncated,
    /// The payload is not a valid encoding for the expected type.
    Invalid(String),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated => write!(f, "payload truncated"),
            DecodeError::Invalid(reason) => write!(f, "malformed payload: {reason}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Terminal outcome of a failed call.
///
/// None of these are recovered inside the invocation layer: no retries, no
/// fallback, no codec downgrade. Blocking calls return the error at the
/// call site; non-blocking calls deliver it through the same handle a
/// success would have used.
#[derive(Debug)]
pub enum RpcError {
    /// The remote peer reported a failure, with any trailing metadata it
    /// attached.
    Status {
        code: ErrorCode,
        message: String,
        trailers: Metadata,
    },
    /// The response bytes were not a valid encoding for the expected type.
    Malformed(DecodeError),
    /// The request failed to serialize; nothing was sent.
    Encode(EncodeError),
    /// No response arrived within the configured deadline.
    DeadlineExceeded,
    /// The caller cancelled the call before it completed.
    Cancelled,
    /// The underlying transport failed.
    Transport(TransportError),
}

impl RpcError {
    /// The status code this failure maps onto.
    ///
    /// Remote-reported statuses keep their own code; local failure kinds
    /// map onto the matching gRPC-aligned code.
    pub fn code(&self) -> ErrorCode {
        match self {
            RpcError::Status { code, .. } => *code,
            RpcError::Malformed(_) => ErrorCode::Internal,
            RpcError::Encode(_) => ErrorCode::Internal,
            RpcError::DeadlineExceeded => ErrorCode::DeadlineExceeded,
            RpcError::Cancelled => ErrorCode::Cancelled,
            RpcError::Transport(_) => ErrorCode::Unavailable,
        }
    }

    /// Trailing metadata attached to the failure, if the peer supplied any.
    pub fn trailers(&self) -> Option<&Metadata> {
        match self {
            RpcError::Status { trailers, .. } => Some(trailers),
            _ => None,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RpcError::Status { code, message, .. } => write!(f, "{code}: {message}"),
            RpcError::Malformed(e) => write!(f, "malformed response: {e}"),
            RpcError::Encode(e) => write!(f, "request encoding failed: {e}"),
            RpcError::DeadlineExceeded => write!(f, "deadline exceeded"),
            RpcError::Cancelled => write!(f, "call cancelled"),
            RpcError::Transport(e) => write!(f, "transport error: {e}"),
        }
    }
}

impl std::error::Error for RpcError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RpcError::Malformed(e) => Some(e),
            RpcError::Encode(e) => Some(e),
            RpcError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TransportError> for RpcError {
    fn from(e: TransportError) -> Self {
        RpcError::Transport(e)
    }
}

impl From<EncodeError> for RpcError {
    fn from(e: EncodeError) -> Self {
        RpcError::Encode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_roundtrip() {
        for val in 0..=14u32 {
            let code = ErrorCode::from_u32(val).unwrap();
            assert_eq!(code.as_u32(), val);
        }
        assert_eq!(ErrorCode::from_u32(99), None);
    }

    #[test]
    fn error_code_display() {
        let s = format!("{}", ErrorCode::DeadlineExceeded);
        assert!(s.contains("deadline"));
        assert!(s.contains('2'));
    }

    #[test]
    fn rpc_error_codes() {
        assert_eq!(RpcError::DeadlineExceeded.code(), ErrorCode::DeadlineExceeded);
        assert_eq!(RpcError::Cancelled.code(), ErrorCode::Cancelled);
        assert_eq!(
            RpcError::Transport(TransportError::Closed).code(),
            ErrorCode::Unavailable
        );
        let status = RpcError::Status {
            code: ErrorCode::NotFound,
            message: "no such recipe".into(),
            trailers: Metadata::new(),
        };
        assert_eq!(status.code(), ErrorCode::NotFound);
    }

    #[test]
    fn failure_kinds_are_distinguishable() {
        assert!(matches!(RpcError::DeadlineExceeded, RpcError::DeadlineExceeded));
        assert!(!matches!(RpcError::Cancelled, RpcError::DeadlineExceeded));
        assert!(!matches!(
            RpcError::Transport(TransportError::Closed),
            RpcError::Cancelled
        ));
    }

    #[test]
    fn status_carries_trailers() {
        let mut trailers = Metadata::new();
        trailers.push("retry-after", "5");
        let err = RpcError::Status {
            code: ErrorCode::Unavailable,
            message: "draining".into(),
            trailers,
        };
        assert_eq!(err.trailers().unwrap().len(), 1);
        assert!(RpcError::Cancelled.trailers().is_none());
    }
}
