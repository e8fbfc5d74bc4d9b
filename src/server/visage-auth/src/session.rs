//! Session lifecycle: login mints the token cookie, logout clears it.

use cookie::time::Duration;
use cookie::{Cookie, SameSite};

use visage_token::{Claims, TOKEN_TTL_SECS};

use crate::config::AuthConfig;
use crate::context::Identity;
use crate::error::AuthError;
use crate::extract::Credentials;

/// Issues and clears the first-party session cookie.
pub struct SessionIssuer {
    config: AuthConfig,
}

impl SessionIssuer {
    /// Creates an issuer for the given configuration.
    pub fn new(config: AuthConfig) -> Self {
        Self { config }
    }

    /// Mints a session token for the identity and returns the cookie to set.
    ///
    /// The cookie is HttpOnly, `SameSite=Lax`, scoped to `/`, with max-age
    /// equal to the token TTL. `secure` must reflect whether the request
    /// arrived over encrypted transport; the flag is set if and only if it
    /// did.
    pub fn login(&self, identity: &Identity, secure: bool) -> Result<Cookie<'static>, AuthError> {
        let claims = Claims::new(
            identity.id.clone(),
            identity.email.clone(),
            identity.first_name.clone(),
            identity.last_name.clone(),
        );
        let token = visage_token::issue(&claims, &self.config.token_secret)?;

        Ok(Cookie::build((self.config.auth_cookie.clone(), token))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .secure(secure)
            .max_age(Duration::seconds(TOKEN_TTL_SECS as i64))
            .build())
    }

    /// Clears the session cookies.
    ///
    /// Requires a currently-valid token: a missing or already-expired token
    /// is an error rather than a silent success, so logout cannot be used to
    /// probe cookie validity. On success the auth cookie and the provider
    /// session cookie are both overwritten with empty values and zero
    /// max-age; the provider cookie is cleared whether or not it parses.
    pub fn logout(&self, credentials: &Credentials) -> Result<Vec<Cookie<'static>>, AuthError> {
        let token = credentials
            .custom_token
            .as_deref()
            .ok_or(AuthError::MissingCredential)?;

        visage_token::verify(token, &self.config.token_secret)?;

        Ok(vec![
            self.removal(self.config.auth_cookie.clone()),
            self.removal(self.config.provider_cookie.clone()),
        ])
    }

    fn removal(&self, name: String) -> Cookie<'static> {
        Cookie::build((name, ""))
            .http_only(true)
            .same_site(SameSite::Lax)
            .path("/")
            .max_age(Duration::ZERO)
            .build()
    }
}
