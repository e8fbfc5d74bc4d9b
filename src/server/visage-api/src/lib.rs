//! # Visage API
//!
//! REST API layer for Visage.
//!
//! ## Endpoints
//!
//! - `POST /v1/auth/session` - exchange a credential for a session cookie
//! - `POST /v1/auth/logout` - clear the session cookies
//! - `GET /v1/auth/me` - the resolved identity
//! - `POST /v1/avatars` - upload an avatar
//! - `GET /v1/avatars` - list own avatars
//! - `GET /v1/avatars/{owner}/{file}` - raw avatar bytes
//! - `DELETE /v1/avatars/{owner}/{file}` - delete an avatar
//!
//! All `/v1/avatars` routes and `/v1/auth/me` sit behind the authentication
//! stage; login and logout manage the session cookie themselves.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
pub mod avatars;
pub mod error;
pub mod middleware;
pub mod state;

pub use error::ApiError;
pub use state::AppState;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Builds the application router over the given state.
pub fn router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/auth/me", get(auth::me))
        .route("/v1/avatars", post(avatars::upload).get(avatars::list))
        .route(
            "/v1/avatars/{owner}/{file}",
            get(avatars::fetch).delete(avatars::remove),
        )
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate,
        ));

    Router::new()
        .route("/v1/auth/session", post(auth::login))
        .route("/v1/auth/logout", post(auth::logout))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
