//! Storage trait definitions and record types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Mirror of an identity-provider account, keyed by subject id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Stable subject identifier from the identity provider.
    pub id: String,
    /// Email address.
    pub email: Option<String>,
    /// First name.
    pub first_name: Option<String>,
    /// Last name.
    pub last_name: Option<String>,
}

/// Metadata for one stored avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarRecord {
    /// Object key of the form `<owner_id>/<opaque-suffix>`.
    pub key: String,
    /// Owning user's subject id (the key's namespace prefix).
    pub owner_id: String,
    /// Display name for the avatar.
    pub name: String,
    /// Relationship label (e.g. "self", "family").
    pub relationship: String,
    /// MIME type of the stored bytes.
    pub content_type: String,
    /// Creation timestamp (Unix seconds).
    pub created_at: i64,
}

/// User record store.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Creates or updates the user row keyed by `record.id`.
    ///
    /// Idempotent by primary key: concurrent upserts of the same subject
    /// converge on the same row. Persistence errors must surface to the
    /// caller, never be dropped.
    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError>;

    /// Fetches a user by subject id.
    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StorageError>;
}

/// Raw object byte store.
///
/// Callers are expected to have passed the ownership gate before issuing
/// get/delete against a key.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get object bytes by key.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Store object bytes under a key.
    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Delete an object by key.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// List keys with a prefix.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Avatar metadata store.
#[async_trait]
pub trait AvatarStore: Send + Sync {
    /// Inserts a new avatar record.
    async fn insert_avatar(&self, record: &AvatarRecord) -> Result<(), StorageError>;

    /// Fetches one avatar record by object key.
    async fn get_avatar(&self, key: &str) -> Result<Option<AvatarRecord>, StorageError>;

    /// Lists all avatar records belonging to an owner, newest first.
    async fn list_avatars(&self, owner_id: &str) -> Result<Vec<AvatarRecord>, StorageError>;

    /// Deletes one avatar record by object key.
    async fn delete_avatar(&self, key: &str) -> Result<(), StorageError>;
}
