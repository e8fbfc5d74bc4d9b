//! Resolved identity types.

use serde::{Deserialize, Serialize};

/// Credential carrier that produced a resolved identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// First-party session token cookie.
    FirstParty,
    /// Bearer token verified against the identity provider.
    Bearer,
    /// Provider-sealed session cookie.
    ProviderSession,
}

/// Resolved, trusted representation of the requester.
///
/// Derived from exactly one verified credential carrier and attached to the
/// request context for the duration of that request. At most one identity
/// exists per request; there is no server-side session state behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    /// Stable subject identifier.
    pub id: String,

    /// Email address.
    pub email: Option<String>,

    /// First name.
    pub first_name: Option<String>,

    /// Last name.
    pub last_name: Option<String>,

    /// Carrier that produced this identity.
    pub source: CredentialSource,
}

impl Identity {
    /// Builds a display name from first + last name.
    pub fn display_name(&self) -> Option<String> {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => Some(format!("{} {}", first, last)),
            (Some(first), None) => Some(first.clone()),
            (None, Some(last)) => Some(last.clone()),
            (None, None) => None,
        }
    }
}
