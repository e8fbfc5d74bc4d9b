//! Identity-provider backed capability implementations.
//!
//! The provider publishes a rotating JWKS for bearer-token verification and
//! exposes a session-authentication endpoint for unsealing its managed
//! session cookies. All failure modes collapse into the owning carrier's
//! rejection class, including timeouts configured on the HTTP client.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::backend::{BearerClaims, BearerVerifier, SessionUnsealer, UnsealedSession};
use crate::error::AuthError;

/// Configuration for the provider integration.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// URL of the provider's published JWKS document.
    pub jwks_url: String,
    /// URL of the provider's session-authentication endpoint.
    pub session_url: String,
    /// Symmetric secret the provider requires to unseal session cookies.
    pub cookie_password: String,
}

/// Claims carried by provider bearer tokens.
#[derive(Debug, Deserialize)]
struct ProviderTokenClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    given_name: Option<String>,
    #[serde(default)]
    family_name: Option<String>,
}

/// Bearer-token verifier backed by the provider's published JWKS.
///
/// The key set is cached in memory and refetched once when a token names an
/// unknown `kid`, so provider key rotation does not require a restart.
pub struct JwksBearerVerifier {
    http: reqwest::Client,
    jwks_url: String,
    keys: RwLock<Option<JwkSet>>,
}

impl JwksBearerVerifier {
    /// Creates a verifier fetching keys from `jwks_url`.
    pub fn new(http: reqwest::Client, jwks_url: impl Into<String>) -> Self {
        Self {
            http,
            jwks_url: jwks_url.into(),
            keys: RwLock::new(None),
        }
    }

    async fn fetch_keys(&self) -> Result<JwkSet, AuthError> {
        debug!(url = %self.jwks_url, "Fetching provider JWKS");

        let set = self
            .http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "JWKS fetch failed");
                AuthError::InvalidBearer
            })?
            .json::<JwkSet>()
            .await
            .map_err(|e| {
                warn!(error = %e, "JWKS parse failed");
                AuthError::InvalidBearer
            })?;

        *self.keys.write().await = Some(set.clone());
        Ok(set)
    }

    /// Returns the decoding key for `kid`, refetching once on a miss.
    async fn key_for(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        if let Some(set) = self.keys.read().await.as_ref() {
            if let Some(jwk) = set.find(kid) {
                return DecodingKey::from_jwk(jwk).map_err(|_| AuthError::InvalidBearer);
            }
        }

        let set = self.fetch_keys().await?;
        let jwk = set.find(kid).ok_or(AuthError::InvalidBearer)?;
        DecodingKey::from_jwk(jwk).map_err(|_| AuthError::InvalidBearer)
    }
}

#[async_trait]
impl BearerVerifier for JwksBearerVerifier {
    async fn verify(&self, token: &str, audience: &str) -> Result<BearerClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidBearer)?;
        let kid = header.kid.ok_or(AuthError::InvalidBearer)?;
        let key = self.key_for(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[audience]);

        let data = decode::<ProviderTokenClaims>(token, &key, &validation).map_err(|e| {
            warn!(error = %e, "Bearer token rejected");
            AuthError::InvalidBearer
        })?;

        let claims = data.claims;
        Ok(BearerClaims {
            subject: claims.sub,
            email: claims.email,
            first_name: claims.given_name,
            last_name: claims.family_name,
        })
    }
}

#[derive(Serialize)]
struct UnsealRequest<'a> {
    sealed_session: &'a str,
    cookie_password: &'a str,
}

/// Session unsealer that delegates to the provider's HTTP endpoint.
///
/// The sealing cryptography stays the provider's concern; this client only
/// forwards the opaque cookie plus the configured unsealing secret and
/// trusts the reported result.
pub struct RemoteSessionUnsealer {
    http: reqwest::Client,
    session_url: String,
    cookie_password: String,
}

impl RemoteSessionUnsealer {
    /// Creates an unsealer posting to `session_url`.
    pub fn new(
        http: reqwest::Client,
        session_url: impl Into<String>,
        cookie_password: impl Into<String>,
    ) -> Self {
        Self {
            http,
            session_url: session_url.into(),
            cookie_password: cookie_password.into(),
        }
    }
}

#[async_trait]
impl SessionUnsealer for RemoteSessionUnsealer {
    async fn unseal(&self, sealed: &str) -> Result<UnsealedSession, AuthError> {
        let response = self
            .http
            .post(&self.session_url)
            .json(&UnsealRequest {
                sealed_session: sealed,
                cookie_password: &self.cookie_password,
            })
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| {
                warn!(error = %e, "Session unseal call failed");
                AuthError::InvalidSession
            })?;

        response
            .json::<UnsealedSession>()
            .await
            .map_err(|_| AuthError::InvalidSession)
    }
}
