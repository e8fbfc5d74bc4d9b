//! Request authorization: identity presence and storage-key ownership.

use crate::context::Identity;
use crate::error::AuthError;

/// Requires that the resolver attached an identity to the request.
pub fn require_identity(identity: Option<&Identity>) -> Result<&Identity, AuthError> {
    identity.ok_or(AuthError::MissingCredential)
}

/// Enforces that a storage key's namespace prefix equals the identity's id.
///
/// The key is split on its first `/`. Fails closed: a key with no separator,
/// an empty owner segment, or an empty suffix is rejected rather than
/// guessed at. Must run before any storage read or delete.
pub fn require_ownership(identity: &Identity, key: &str) -> Result<(), AuthError> {
    match key.split_once('/') {
        Some((owner, suffix)) if !owner.is_empty() && !suffix.is_empty() => {
            if owner == identity.id {
                Ok(())
            } else {
                Err(AuthError::Forbidden)
            }
        }
        _ => Err(AuthError::Forbidden),
    }
}
