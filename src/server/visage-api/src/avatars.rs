//! Avatar CRUD handlers.
//!
//! Every read and delete runs the ownership gate before touching storage:
//! a key outside the caller's namespace is a 403, never a 404.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;

use visage_auth::{gate, Identity};
use visage_storage::AvatarRecord;

use crate::error::ApiError;
use crate::state::AppState;

/// Upload request body.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    /// Display name for the avatar.
    pub name: String,
    /// Relationship label.
    pub relationship: String,
    /// MIME type of the payload.
    #[serde(default = "default_content_type")]
    pub content_type: String,
    /// Base64-encoded image bytes.
    pub data: String,
}

fn default_content_type() -> String {
    "image/png".to_string()
}

/// `POST /v1/avatars` - store a new avatar under the caller's namespace.
pub async fn upload(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Json(body): Json<UploadRequest>,
) -> Result<(StatusCode, Json<AvatarRecord>), ApiError> {
    let identity = gate::require_identity(identity.as_ref().map(|ext| &ext.0))?;

    let bytes = BASE64
        .decode(body.data.as_bytes())
        .map_err(|_| ApiError::BadRequest("data is not valid base64".to_string()))?;

    let key = format!(
        "{}/{}.{}",
        identity.id,
        random_suffix(),
        extension_for(&body.content_type)
    );

    state.objects.put(&key, &bytes).await?;

    let record = AvatarRecord {
        key,
        owner_id: identity.id.clone(),
        name: body.name,
        relationship: body.relationship,
        content_type: body.content_type,
        created_at: unix_now(),
    };
    state.avatars.insert_avatar(&record).await?;

    tracing::info!(owner = %record.owner_id, key = %record.key, "Avatar stored");

    Ok((StatusCode::CREATED, Json(record)))
}

/// `GET /v1/avatars` - list the caller's avatars, newest first.
pub async fn list(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
) -> Result<Json<Vec<AvatarRecord>>, ApiError> {
    let identity = gate::require_identity(identity.as_ref().map(|ext| &ext.0))?;

    Ok(Json(state.avatars.list_avatars(&identity.id).await?))
}

/// `GET /v1/avatars/{owner}/{file}` - raw avatar bytes.
pub async fn fetch(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path((owner, file)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let identity = gate::require_identity(identity.as_ref().map(|ext| &ext.0))?;

    let key = format!("{owner}/{file}");
    gate::require_ownership(identity, &key)?;

    let bytes = state.objects.get(&key).await?.ok_or(ApiError::NotFound)?;
    let content_type = state
        .avatars
        .get_avatar(&key)
        .await?
        .map(|record| record.content_type)
        .unwrap_or_else(|| "application/octet-stream".to_string());

    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// `DELETE /v1/avatars/{owner}/{file}` - delete one avatar.
pub async fn remove(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path((owner, file)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let identity = gate::require_identity(identity.as_ref().map(|ext| &ext.0))?;

    let key = format!("{owner}/{file}");
    gate::require_ownership(identity, &key)?;

    if state.objects.get(&key).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    state.objects.delete(&key).await?;
    state.avatars.delete_avatar(&key).await?;

    tracing::info!(owner = %identity.id, key = %key, "Avatar deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Returns the current Unix timestamp.
fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX epoch")
        .as_secs() as i64
}

/// Random hex suffix for object keys.
fn random_suffix() -> String {
    use rand::RngCore;

    let mut buf = [0u8; 8];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    buf.iter().map(|b| format!("{b:02x}")).collect()
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}
