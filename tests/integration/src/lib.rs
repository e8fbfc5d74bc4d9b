//! End-to-end tests for Visage.
//!
//! Starts the real router on an ephemeral port with in-memory storage and
//! stubbed identity-provider capabilities, then drives it over HTTP with a
//! cookie-aware client.

use std::sync::Arc;

use async_trait::async_trait;

use visage_api::AppState;
use visage_auth::{
    AuthConfig, AuthError, BearerClaims, BearerVerifier, IdentityResolver, ProviderUser,
    SessionIssuer, SessionUnsealer, UnsealedSession,
};
use visage_storage::MemoryBackend;

/// Bearer verifier accepting tokens of the form `valid-bearer-<subject>`.
pub struct StubVerifier;

#[async_trait]
impl BearerVerifier for StubVerifier {
    async fn verify(&self, token: &str, _audience: &str) -> Result<BearerClaims, AuthError> {
        let subject = token
            .strip_prefix("valid-bearer-")
            .ok_or(AuthError::InvalidBearer)?;
        Ok(BearerClaims {
            subject: subject.to_string(),
            email: Some(format!("{subject}@example.com")),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        })
    }
}

/// Session unsealer accepting exactly the string `sealed-ok`.
pub struct StubUnsealer;

#[async_trait]
impl SessionUnsealer for StubUnsealer {
    async fn unseal(&self, sealed: &str) -> Result<UnsealedSession, AuthError> {
        if sealed != "sealed-ok" {
            return Err(AuthError::InvalidSession);
        }
        Ok(UnsealedSession {
            authenticated: true,
            user: Some(ProviderUser {
                id: "u3".to_string(),
                email: Some("u3@example.com".to_string()),
                first_name: None,
                last_name: None,
            }),
        })
    }
}

/// An in-process server bound to an ephemeral port.
pub struct TestServer {
    /// Base URL, e.g. `http://127.0.0.1:49152`.
    pub base_url: String,
}

impl TestServer {
    /// Builds the full application state and starts serving it.
    pub async fn start() -> anyhow::Result<Self> {
        let config = AuthConfig::new("integration-secret-at-least-32-chars!", "visage");
        config.validate()?;

        let backend = MemoryBackend::new();
        let resolver = Arc::new(IdentityResolver::new(
            config.clone(),
            Arc::new(StubVerifier),
            Arc::new(StubUnsealer),
            Arc::new(backend.clone()),
        ));
        let issuer = Arc::new(SessionIssuer::new(config.clone()));

        let state = AppState {
            config,
            resolver,
            issuer,
            objects: Arc::new(backend.clone()),
            avatars: Arc::new(backend),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        tokio::spawn(async move {
            axum::serve(listener, visage_api::router(state))
                .await
                .expect("server task failed");
        });

        Ok(Self {
            base_url: format!("http://{addr}"),
        })
    }

    /// A client with a cookie store, behaving the way a browser would.
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("failed to build client")
    }

    /// Full URL for a path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use reqwest::header::SET_COOKIE;
    use reqwest::StatusCode;
    use serde_json::Value;

    const PNG_BYTES: &[u8] = b"not-really-a-png-but-close-enough";

    /// Logs in via the stub bearer token; the session cookie lands in the
    /// client's jar and carries subsequent requests.
    async fn login(server: &TestServer, client: &reqwest::Client, subject: &str) {
        let response = client
            .post(server.url("/v1/auth/session"))
            .header("Authorization", format!("Bearer valid-bearer-{subject}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    async fn upload(server: &TestServer, client: &reqwest::Client, name: &str) -> Value {
        let response = client
            .post(server.url("/v1/avatars"))
            .json(&serde_json::json!({
                "name": name,
                "relationship": "family",
                "content_type": "image/png",
                "data": BASE64.encode(PNG_BYTES),
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        response.json().await.unwrap()
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_me_works() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();

        let response = client
            .post(server.url("/v1/auth/session"))
            .header("Authorization", "Bearer valid-bearer-u1")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(
            response.headers().get(SET_COOKIE).is_some(),
            "login must set the session cookie"
        );

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["user"]["id"], "u1");

        // Cookie only now; no Authorization header.
        let me: Value = client
            .get(server.url("/v1/auth/me"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(me["user"]["id"], "u1");
        assert_eq!(me["user"]["source"], "first_party");
        assert_eq!(me["display_name"], "Test User");
    }

    #[tokio::test]
    async fn test_login_without_credentials_is_401() {
        let server = TestServer::start().await.unwrap();

        let response = server
            .client()
            .post(server.url("/v1/auth/session"))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "missing credential");
    }

    #[tokio::test]
    async fn test_invalid_bearer_reports_carrier() {
        let server = TestServer::start().await.unwrap();

        let response = server
            .client()
            .get(server.url("/v1/auth/me"))
            .header("Authorization", "Bearer forged")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "invalid bearer");
    }

    #[tokio::test]
    async fn test_bearer_works_directly_without_login() {
        let server = TestServer::start().await.unwrap();

        let me: Value = server
            .client()
            .get(server.url("/v1/auth/me"))
            .header("Authorization", "Bearer valid-bearer-u9")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(me["user"]["id"], "u9");
        assert_eq!(me["user"]["source"], "bearer");
    }

    #[tokio::test]
    async fn test_provider_session_cookie_resolves() {
        let server = TestServer::start().await.unwrap();

        let me: Value = server
            .client()
            .get(server.url("/v1/auth/me"))
            .header("Cookie", "provider_session=sealed-ok")
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(me["user"]["id"], "u3");
        assert_eq!(me["user"]["source"], "provider_session");
    }

    #[tokio::test]
    async fn test_garbage_cookie_falls_through_to_bearer() {
        let server = TestServer::start().await.unwrap();

        let response = server
            .client()
            .get(server.url("/v1/auth/me"))
            .header("Cookie", "visage_token=garbage")
            .header("Authorization", "Bearer valid-bearer-u1")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_garbage_cookie_alone_is_invalid_signature() {
        let server = TestServer::start().await.unwrap();

        let response = server
            .client()
            .get(server.url("/v1/auth/me"))
            .header("Cookie", "visage_token=garbage")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"], "invalid signature");
    }

    #[tokio::test]
    async fn test_avatar_crud_roundtrip() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();
        login(&server, &client, "u1").await;

        // Upload
        let record = upload(&server, &client, "Grandma").await;
        let key = record["key"].as_str().unwrap().to_string();
        assert!(key.starts_with("u1/"), "key should be namespaced: {key}");
        assert_eq!(record["owner_id"], "u1");
        assert_eq!(record["name"], "Grandma");

        // List
        let listed: Value = client
            .get(server.url("/v1/avatars"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed.as_array().unwrap().len(), 1);

        // Fetch bytes back
        let response = client
            .get(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()["content-type"].to_str().unwrap(),
            "image/png"
        );
        assert_eq!(response.bytes().await.unwrap().as_ref(), PNG_BYTES);

        // Delete
        let response = client
            .delete(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // Gone now
        let response = client
            .get(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_cross_user_access_is_forbidden() {
        let server = TestServer::start().await.unwrap();

        let alice = server.client();
        login(&server, &alice, "u1").await;
        let record = upload(&server, &alice, "Mine").await;
        let key = record["key"].as_str().unwrap().to_string();

        let mallory = server.client();
        login(&server, &mallory, "u2").await;

        let response = mallory
            .get(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = mallory
            .delete(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Still there for its owner.
        let response = alice
            .get(server.url(&format!("/v1/avatars/{key}")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_avatar_listing_is_scoped_to_caller() {
        let server = TestServer::start().await.unwrap();

        let alice = server.client();
        login(&server, &alice, "u1").await;
        upload(&server, &alice, "A").await;

        let bob = server.client();
        login(&server, &bob, "u2").await;

        let listed: Value = bob
            .get(server.url("/v1/avatars"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert!(listed.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_logout_clears_session_and_double_logout_is_401() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();
        login(&server, &client, "u1").await;

        let response = client
            .post(server.url("/v1/auth/logout"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        // The cleared cookie is gone from the jar, so the session is dead.
        let response = client
            .get(server.url("/v1/auth/me"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        // And a second logout has nothing valid to present.
        let response = client
            .post(server.url("/v1/auth/logout"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_logout_without_session_is_401() {
        let server = TestServer::start().await.unwrap();

        let response = server
            .client()
            .post(server.url("/v1/auth/logout"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_rejects_bad_base64() {
        let server = TestServer::start().await.unwrap();
        let client = server.client();
        login(&server, &client, "u1").await;

        let response = client
            .post(server.url("/v1/avatars"))
            .json(&serde_json::json!({
                "name": "Broken",
                "relationship": "self",
                "data": "!!! not base64 !!!",
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
