//! Authentication stage for protected routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use visage_auth::Credentials;

use crate::error::ApiError;
use crate::state::AppState;

/// Resolves the request's credentials and attaches the identity.
///
/// On success the [`visage_auth::Identity`] is inserted as a request
/// extension for handlers to pick up; on failure the request terminates
/// here with the resolver's typed rejection.
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let credentials = Credentials::extract(request.headers(), &state.config);
    let identity = state.resolver.resolve(&credentials).await?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// True when the request arrived over an encrypted transport.
///
/// TLS is terminated upstream; the forwarded protocol header is the signal.
pub fn transport_is_secure(headers: &axum::http::HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .map(|proto| proto.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}
