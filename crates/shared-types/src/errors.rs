//! # Error Types
//!
//! Defines error types shared across subsystems.

use thiserror::Error;

/// Errors raised while decoding wire or canonical encodings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Input ended before the value was complete.
    #[error("Unexpected end of input: needed {needed} more bytes")]
    UnexpectedEof { needed: usize },

    /// A varint used a longer form than required.
    #[error("Non-canonical varint encoding")]
    NonCanonicalVarInt,

    /// A length prefix exceeds the allowed maximum.
    #[error("Length {len} exceeds maximum {max}")]
    LengthTooLarge { len: u64, max: u64 },

    /// Amount string could not be parsed.
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Byte string was not valid UTF-8.
    #[error("Invalid UTF-8 string")]
    InvalidUtf8,

    /// Unknown enum discriminant.
    #[error("Unknown {kind} tag: {tag}")]
    UnknownTag { kind: &'static str, tag: u64 },

    /// Embedded content hash does not match the decoded fields.
    #[error("Content hash mismatch")]
    HashMismatch,

    /// Hex decoding failed.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Serde/bincode failure.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Node operational states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Normal operation.
    Running,
    /// Synchronizing with the network.
    Syncing,
}
