//! Parse and conversion errors for the shared value types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid cb58 string: {0}")]
    InvalidCb58(String),

    #[error("cb58 checksum mismatch")]
    ChecksumMismatch,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("invalid node id: {0}")]
    InvalidNodeId(String),

    #[error("unknown chain alias: {0}")]
    UnknownChain(String),
}
