//! Authentication error types.

use thiserror::Error;

use visage_storage::StorageError;
use visage_token::TokenError;

/// Errors that can occur during authentication and authorization.
///
/// Every credential-kind variant is client-correctable and surfaces as a
/// 401 with its reason string; [`AuthError::Forbidden`] surfaces as 403;
/// [`AuthError::Persistence`] and [`AuthError::WeakSecret`] are
/// infrastructure failures and surface as 500.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential carrier was present on the request.
    #[error("missing credential")]
    MissingCredential,

    /// First-party token signature mismatch or malformed token.
    #[error("invalid signature")]
    InvalidSignature,

    /// First-party token has expired.
    #[error("expired")]
    Expired,

    /// Bearer token rejected by the identity provider's keys.
    #[error("invalid bearer")]
    InvalidBearer,

    /// Provider session could not be unsealed or is not authenticated.
    #[error("invalid session")]
    InvalidSession,

    /// Signing secret below the 32-byte floor (configuration error).
    #[error("weak secret: signing secret must be at least 32 bytes")]
    WeakSecret,

    /// User record upsert failed.
    #[error("persistence failure: {0}")]
    Persistence(String),

    /// Storage key ownership check failed.
    #[error("forbidden")]
    Forbidden,
}

impl AuthError {
    /// Machine-readable reason string for response bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing credential",
            Self::InvalidSignature => "invalid signature",
            Self::Expired => "expired",
            Self::InvalidBearer => "invalid bearer",
            Self::InvalidSession => "invalid session",
            Self::WeakSecret => "weak secret",
            Self::Persistence(_) => "persistence failure",
            Self::Forbidden => "forbidden",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::WeakSecret => Self::WeakSecret,
            TokenError::Expired => Self::Expired,
            TokenError::InvalidSignature => Self::InvalidSignature,
        }
    }
}

impl From<StorageError> for AuthError {
    fn from(err: StorageError) -> Self {
        Self::Persistence(err.to_string())
    }
}
