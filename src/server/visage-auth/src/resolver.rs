//! Identity resolution: the layered credential strategy.

use std::sync::Arc;

use tracing::{debug, warn};

use visage_storage::{UserRecord, UserStore};

use crate::backend::{BearerVerifier, SessionUnsealer};
use crate::config::AuthConfig;
use crate::context::{CredentialSource, Identity};
use crate::error::AuthError;
use crate::extract::Credentials;

/// Outcome of one resolution strategy.
enum Attempt {
    /// Carrier verified; resolution stops here.
    Resolved(Identity),
    /// Carrier absent or deliberately passed over; try the next one.
    Skip,
    /// Terminal failure; no further carriers are consulted.
    Rejected(AuthError),
}

/// Resolves a request's credentials into a single [`Identity`].
///
/// Carriers are tried in fixed priority order: first-party token (no
/// external call), then bearer token, then provider session. The first
/// success wins and claims are never merged across carriers.
///
/// Resolution is fully synchronous relative to the request and holds no
/// state beyond it; concurrent requests share nothing mutable here.
pub struct IdentityResolver {
    config: AuthConfig,
    verifier: Arc<dyn BearerVerifier>,
    unsealer: Arc<dyn SessionUnsealer>,
    users: Arc<dyn UserStore>,
}

impl IdentityResolver {
    /// Creates a resolver over the given capabilities.
    pub fn new(
        config: AuthConfig,
        verifier: Arc<dyn BearerVerifier>,
        unsealer: Arc<dyn SessionUnsealer>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            config,
            verifier,
            unsealer,
            users,
        }
    }

    /// Resolves the request's credentials or reports why it cannot.
    ///
    /// # Errors
    ///
    /// Each rejection names the carrier that failed and why; see
    /// [`AuthError`] for the mapping to response codes.
    pub async fn resolve(&self, credentials: &Credentials) -> Result<Identity, AuthError> {
        match self.try_first_party(credentials) {
            Attempt::Resolved(identity) => return Ok(identity),
            Attempt::Rejected(err) => return Err(err),
            Attempt::Skip => {}
        }

        match self.try_bearer(credentials).await {
            Attempt::Resolved(identity) => return Ok(identity),
            Attempt::Rejected(err) => return Err(err),
            Attempt::Skip => {}
        }

        match self.try_provider_session(credentials).await {
            Attempt::Resolved(identity) => return Ok(identity),
            Attempt::Rejected(err) => return Err(err),
            Attempt::Skip => {}
        }

        Err(AuthError::MissingCredential)
    }

    /// Strategy 1: first-party session token, verified with the shared
    /// secret. Cheapest path, no external call.
    fn try_first_party(&self, credentials: &Credentials) -> Attempt {
        let Some(token) = credentials.custom_token.as_deref() else {
            return Attempt::Skip;
        };

        match visage_token::verify(token, &self.config.token_secret) {
            Ok(claims) => {
                debug!(subject = %claims.sub, "Resolved via first-party token");
                Attempt::Resolved(Identity {
                    id: claims.sub,
                    email: claims.email,
                    first_name: claims.given_name,
                    last_name: claims.family_name,
                    source: CredentialSource::FirstParty,
                })
            }
            Err(err) => {
                // A stale first-party cookie must not block an otherwise
                // valid bearer or provider-session request. When it is the
                // only carrier, its specific failure is the outcome.
                if credentials.bearer_token.is_some() || credentials.provider_session.is_some() {
                    warn!(error = %err, "First-party token invalid, trying next carrier");
                    Attempt::Skip
                } else {
                    Attempt::Rejected(err.into())
                }
            }
        }
    }

    /// Strategy 2: provider bearer token. A verification failure is
    /// terminal; it does not fall through to the provider session.
    async fn try_bearer(&self, credentials: &Credentials) -> Attempt {
        let Some(token) = credentials.bearer_token.as_deref() else {
            return Attempt::Skip;
        };

        let claims = match self.verifier.verify(token, &self.config.audience).await {
            Ok(claims) => claims,
            Err(err) => return Attempt::Rejected(err),
        };

        // Mirror the provider record before any query can reference it.
        if let Err(err) = self
            .provision(
                &claims.subject,
                claims.email.clone(),
                claims.first_name.clone(),
                claims.last_name.clone(),
            )
            .await
        {
            return Attempt::Rejected(err);
        }

        debug!(subject = %claims.subject, "Resolved via bearer token");
        Attempt::Resolved(Identity {
            id: claims.subject,
            email: claims.email,
            first_name: claims.first_name,
            last_name: claims.last_name,
            source: CredentialSource::Bearer,
        })
    }

    /// Strategy 3: provider-sealed session cookie.
    async fn try_provider_session(&self, credentials: &Credentials) -> Attempt {
        let Some(sealed) = credentials.provider_session.as_deref() else {
            return Attempt::Skip;
        };

        let session = match self.unsealer.unseal(sealed).await {
            Ok(session) => session,
            Err(err) => return Attempt::Rejected(err),
        };

        let user = match session.user {
            Some(user) if session.authenticated => user,
            _ => return Attempt::Rejected(AuthError::InvalidSession),
        };

        if let Err(err) = self
            .provision(
                &user.id,
                user.email.clone(),
                user.first_name.clone(),
                user.last_name.clone(),
            )
            .await
        {
            return Attempt::Rejected(err);
        }

        debug!(subject = %user.id, "Resolved via provider session");
        Attempt::Resolved(Identity {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            source: CredentialSource::ProviderSession,
        })
    }

    /// Upserts the local mirror of the provider account.
    async fn provision(
        &self,
        id: &str,
        email: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<(), AuthError> {
        let record = UserRecord {
            id: id.to_string(),
            email,
            first_name,
            last_name,
        };
        self.users.upsert_user(&record).await.map_err(AuthError::from)
    }
}
