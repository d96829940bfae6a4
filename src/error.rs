//! Error types for nodestore
//!
//! Provides a unified error type for store operations, plus the error a
//! block-type callback returns when raw bytes do not verify against a key.

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for nodestore operations
///
/// Ordinary absence (missing, unreadable or short record files) is never an
/// error: it surfaces as `Ok(None)` from `fetch`.
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Write Policy Errors
    // -------------------------------------------------------------------------
    /// Different content already occupies the routing key and `overwrite`
    /// was not requested. The stored record is left untouched.
    #[error("Key collision on routing key {routing_key}")]
    KeyCollision { routing_key: String },

    // -------------------------------------------------------------------------
    // Input Errors
    // -------------------------------------------------------------------------
    #[error("Routing key must be at least 2 bytes, got {len}")]
    InvalidRoutingKey { len: usize },

    #[error("Block {field} has length {actual}, store expects {expected}")]
    ShapeMismatch {
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Payload of {len} bytes exceeds block size {max}")]
    PayloadTooLarge { len: usize, max: usize },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Capability Errors
    // -------------------------------------------------------------------------
    #[error("Not supported: {0}")]
    Unsupported(&'static str),
}

impl StoreError {
    /// Build a collision error for the given routing key
    pub(crate) fn collision(routing_key: &[u8]) -> Self {
        StoreError::KeyCollision {
            routing_key: hex::encode_upper(routing_key),
        }
    }

    /// True if this is a `KeyCollision`
    pub fn is_collision(&self) -> bool {
        matches!(self, StoreError::KeyCollision { .. })
    }
}

/// Raised by a [`StoreCallback`](crate::callback::StoreCallback) when stored
/// bytes cannot be verified against the routing key they were filed under.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Key verification failed: {0}")]
pub struct KeyVerifyError(pub String);

impl KeyVerifyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self(reason.into())
    }
}
