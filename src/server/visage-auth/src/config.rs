//! Authentication configuration.

use crate::error::AuthError;

/// Default name of the first-party session cookie.
pub const DEFAULT_AUTH_COOKIE: &str = "visage_token";

/// Default name of the provider-managed session cookie.
pub const DEFAULT_PROVIDER_COOKIE: &str = "provider_session";

/// Configuration shared by the resolver and the session issuer.
///
/// Constructed once at startup and passed in explicitly; nothing in the
/// core reads ambient global state.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 signing secret for first-party session tokens.
    pub token_secret: String,

    /// Audience identifier expected in provider bearer tokens.
    pub audience: String,

    /// Name of the first-party session cookie.
    pub auth_cookie: String,

    /// Name of the provider-managed session cookie.
    pub provider_cookie: String,
}

impl AuthConfig {
    /// Creates a config with the default cookie names.
    pub fn new(token_secret: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            token_secret: token_secret.into(),
            audience: audience.into(),
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
            provider_cookie: DEFAULT_PROVIDER_COOKIE.to_string(),
        }
    }

    /// Validates startup-time invariants.
    ///
    /// A weak signing secret should abort boot here rather than surface
    /// mid-request; the token codec still re-checks on every call.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.token_secret.len() < visage_token::MIN_SECRET_LEN {
            return Err(AuthError::WeakSecret);
        }
        Ok(())
    }
}
