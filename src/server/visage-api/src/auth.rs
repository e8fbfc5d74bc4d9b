//! Login, logout, and identity handlers.

use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Serialize;

use visage_auth::{gate, Credentials, Identity};

use crate::error::ApiError;
use crate::middleware::transport_is_secure;
use crate::state::AppState;

/// Body of a successful login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// The resolved identity the session was minted for.
    pub user: Identity,
}

/// Body of `GET /v1/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    /// Resolved identity.
    pub user: Identity,
    /// First + last name, when known.
    pub display_name: Option<String>,
}

/// `POST /v1/auth/session` - exchange any valid credential carrier for a
/// first-party session cookie.
///
/// Resolution runs inline here (the route sits outside the auth stage) so a
/// bearer token or provider session can bootstrap the cookie.
pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credentials = Credentials::extract(&headers, &state.config);
    let identity = state.resolver.resolve(&credentials).await?;

    let cookie = state
        .issuer
        .login(&identity, transport_is_secure(&headers))?;

    let mut response = (
        StatusCode::OK,
        Json(SessionResponse { user: identity }),
    )
        .into_response();
    response
        .headers_mut()
        .append(SET_COOKIE, cookie_header(&cookie)?);

    Ok(response)
}

/// `POST /v1/auth/logout` - clear the session cookies.
///
/// Requires a live session token; an expired or missing one is a 401, so
/// repeated logout does not silently succeed.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let credentials = Credentials::extract(&headers, &state.config);
    let cleared = state.issuer.logout(&credentials)?;

    let mut response = StatusCode::NO_CONTENT.into_response();
    for cookie in &cleared {
        response.headers_mut().append(SET_COOKIE, cookie_header(cookie)?);
    }

    Ok(response)
}

/// `GET /v1/auth/me` - the identity the auth stage resolved.
pub async fn me(
    identity: Option<Extension<Identity>>,
) -> Result<Json<MeResponse>, ApiError> {
    let identity = gate::require_identity(identity.as_ref().map(|ext| &ext.0))?;

    Ok(Json(MeResponse {
        display_name: identity.display_name(),
        user: identity.clone(),
    }))
}

fn cookie_header(cookie: &cookie::Cookie<'_>) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|_| ApiError::Internal("cookie not header-safe".to_string()))
}
