//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use visage_auth::AuthError;
use visage_storage::StorageError;

/// Errors surfaced by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Authentication or authorization failure.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Storage failure outside the resolver (avatar reads/writes).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Key passed the ownership check but no object exists under it.
    #[error("not found")]
    NotFound,

    /// Malformed request body.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Unexpected internal failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            Self::Auth(err) => (status_for(err), err.reason().to_string()),
            Self::Storage(err) => {
                tracing::error!(error = %err, "Storage failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "persistence failure".to_string())
            }
            Self::NotFound => (StatusCode::NOT_FOUND, "not found".to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(json!({ "error": reason }))).into_response()
    }
}

/// Response code for each authentication failure kind.
///
/// Credential failures are client-correctable and map to 401, never a
/// generic 500; ownership violations map to 403; infrastructure failures
/// (upsert, misconfigured secret) map to 500.
fn status_for(err: &AuthError) -> StatusCode {
    match err {
        AuthError::MissingCredential
        | AuthError::InvalidSignature
        | AuthError::Expired
        | AuthError::InvalidBearer
        | AuthError::InvalidSession => StatusCode::UNAUTHORIZED,
        AuthError::Forbidden => StatusCode::FORBIDDEN,
        AuthError::WeakSecret | AuthError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_401() {
        for err in [
            AuthError::MissingCredential,
            AuthError::InvalidSignature,
            AuthError::Expired,
            AuthError::InvalidBearer,
            AuthError::InvalidSession,
        ] {
            assert_eq!(status_for(&err), StatusCode::UNAUTHORIZED, "{err}");
        }
    }

    #[test]
    fn test_ownership_failure_is_403() {
        assert_eq!(status_for(&AuthError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_infrastructure_failures_are_500() {
        assert_eq!(
            status_for(&AuthError::WeakSecret),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&AuthError::Persistence("disk full".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
