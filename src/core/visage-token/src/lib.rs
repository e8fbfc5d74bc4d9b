//! # Visage Token
//!
//! Self-contained signed session tokens.
//!
//! A token is a compact HS256 JWT carrying a subset of the resolved identity
//! plus issued-at and expiry timestamps. Tokens are minted at login, verified
//! on every request, and never revoked server-side: expiry is the only
//! termination mechanism short of rotating the signing secret.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub use error::TokenError;

/// Token lifetime (24 hours).
pub const TOKEN_TTL_SECS: u64 = 24 * 60 * 60;

/// Minimum signing secret length in bytes.
///
/// Secrets below this floor are rejected before any cryptographic work,
/// whether or not startup validation already ran.
pub const MIN_SECRET_LEN: usize = 32;

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (stable account identifier).
    pub sub: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// First name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Last name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Issued at (Unix seconds).
    pub iat: u64,
    /// Expiration (Unix seconds).
    pub exp: u64,
}

impl Claims {
    /// Creates claims for a subject, stamping issued-at now and expiry at
    /// now + [`TOKEN_TTL_SECS`].
    pub fn new(
        sub: impl Into<String>,
        email: Option<String>,
        given_name: Option<String>,
        family_name: Option<String>,
    ) -> Self {
        let now = unix_now();
        Self {
            sub: sub.into(),
            email,
            given_name,
            family_name,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        }
    }
}

/// Signs the given claims into a compact token string.
///
/// # Errors
///
/// Returns [`TokenError::WeakSecret`] when the secret is shorter than
/// [`MIN_SECRET_LEN`] bytes, without attempting to sign.
pub fn issue(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    check_secret(secret)?;

    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key).map_err(|_| TokenError::InvalidSignature)
}

/// Verifies a token and returns its claims.
///
/// Expiry is checked with zero leeway. Tokens whose header advertises any
/// algorithm other than HS256 are rejected outright; the algorithm allow-list
/// fails closed rather than trusting the header.
///
/// # Errors
///
/// * [`TokenError::WeakSecret`] - secret below the floor
/// * [`TokenError::Expired`] - valid signature, expiry in the past
/// * [`TokenError::InvalidSignature`] - anything else
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    check_secret(secret)?;

    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::InvalidSignature,
    })?;

    Ok(data.claims)
}

/// Returns the current Unix timestamp.
fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_secs()
}

fn check_secret(secret: &str) -> Result<(), TokenError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(TokenError::WeakSecret);
    }
    Ok(())
}
