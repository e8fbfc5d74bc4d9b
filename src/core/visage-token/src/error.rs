//! Token error types.

use thiserror::Error;

/// Errors that can occur when issuing or verifying session tokens.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum TokenError {
    /// Signing secret is below the 32-byte floor.
    #[error("weak secret: signing secret must be at least 32 bytes")]
    WeakSecret,

    /// Token expiry is in the past.
    #[error("expired")]
    Expired,

    /// Signature mismatch, malformed token, or unexpected algorithm.
    #[error("invalid signature")]
    InvalidSignature,
}
