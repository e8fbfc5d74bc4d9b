//! Syntactic extraction of credential carriers from request headers.

use cookie::Cookie;
use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;

use crate::config::AuthConfig;

/// Raw credential material pulled from a request.
///
/// Nothing here is validated; extraction is purely syntactic. At most one
/// value of each kind is kept (the last occurrence wins when a cookie name
/// repeats).
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// First-party session token from the auth cookie.
    pub custom_token: Option<String>,

    /// Bearer token from the `Authorization` header.
    pub bearer_token: Option<String>,

    /// Provider-sealed session from the provider cookie.
    pub provider_session: Option<String>,
}

impl Credentials {
    /// Extracts all carriers present on a request.
    ///
    /// The bearer prefix match is exact and case-sensitive (`Bearer `), and
    /// an empty remainder is treated as absent. All `Cookie` headers are
    /// scanned, not just the first.
    pub fn extract(headers: &HeaderMap, config: &AuthConfig) -> Self {
        let bearer_token = headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .filter(|rest| !rest.is_empty())
            .map(str::to_string);

        let mut custom_token = None;
        let mut provider_session = None;

        for header in headers.get_all(COOKIE) {
            let Ok(raw) = header.to_str() else { continue };
            for cookie in Cookie::split_parse(raw.to_string()).flatten() {
                if cookie.name() == config.auth_cookie {
                    custom_token = Some(cookie.value().to_string());
                } else if cookie.name() == config.provider_cookie {
                    provider_session = Some(cookie.value().to_string());
                }
            }
        }

        Self {
            custom_token,
            bearer_token,
            provider_session,
        }
    }

    /// True when no carrier is present at all.
    pub fn is_empty(&self) -> bool {
        self.custom_token.is_none()
            && self.bearer_token.is_none()
            && self.provider_session.is_none()
    }
}
