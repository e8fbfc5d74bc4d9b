//! Identity-provider capability traits.
//!
//! The external provider is reached only through these interfaces, so the
//! core never depends on a specific provider SDK's shape.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Claims returned by a successful bearer-token verification.
#[derive(Debug, Clone)]
pub struct BearerClaims {
    /// Subject (stable account identifier).
    pub subject: String,
    /// Email address.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// User object carried inside an unsealed provider session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderUser {
    /// Subject identifier.
    pub id: String,
    /// Email address.
    #[serde(default)]
    pub email: Option<String>,
    /// First name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Last name.
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Result of unsealing a provider session cookie.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsealedSession {
    /// Whether the provider considers the session authenticated.
    pub authenticated: bool,
    /// The session's user, present when authenticated.
    #[serde(default)]
    pub user: Option<ProviderUser>,
}

/// Verifies bearer tokens against the provider's published key set.
#[async_trait]
pub trait BearerVerifier: Send + Sync {
    /// Validates the token for the given audience and returns its claims.
    ///
    /// All failure modes (bad signature, expired, wrong audience, network)
    /// collapse into [`AuthError::InvalidBearer`]; callers never retry.
    async fn verify(&self, token: &str, audience: &str) -> Result<BearerClaims, AuthError>;
}

/// Unseals provider-managed session cookies.
#[async_trait]
pub trait SessionUnsealer: Send + Sync {
    /// Unseals the opaque session string.
    ///
    /// Transport and provider errors collapse into
    /// [`AuthError::InvalidSession`].
    async fn unseal(&self, sealed: &str) -> Result<UnsealedSession, AuthError>;
}
