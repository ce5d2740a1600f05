//! Protocol error types.

use thiserror::Error;

/// Errors raised while encoding or decoding persisted messages.
#[derive(Debug, Error)]
pub enum Error {
    /// Serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization failed.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// The file was written with another format version.
    #[error("format version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u32, actual: u32 },

    /// The message decoded but violates a structural rule of the format.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
