//! Shared application state.

use std::sync::Arc;

use visage_auth::{AuthConfig, IdentityResolver, SessionIssuer};
use visage_storage::{AvatarStore, ObjectStore};

/// State threaded through the router.
///
/// Everything here is either immutable configuration or a capability handle;
/// no cross-request mutable state lives at this layer.
#[derive(Clone)]
pub struct AppState {
    /// Authentication configuration (secret, audience, cookie names).
    pub config: AuthConfig,
    /// Credential resolution core.
    pub resolver: Arc<IdentityResolver>,
    /// Session cookie lifecycle.
    pub issuer: Arc<SessionIssuer>,
    /// Avatar byte storage.
    pub objects: Arc<dyn ObjectStore>,
    /// Avatar metadata storage.
    pub avatars: Arc<dyn AvatarStore>,
}
