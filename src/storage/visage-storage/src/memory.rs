//! In-memory backend for dev mode and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::backend::{AvatarRecord, AvatarStore, ObjectStore, UserRecord, UserStore};
use crate::error::StorageError;

/// Non-persistent backend holding everything in process memory.
///
/// Cloning is cheap; clones share the same underlying maps.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
    objects: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    avatars: Arc<RwLock<HashMap<String, AvatarRecord>>>,
}

impl MemoryBackend {
    /// Creates an empty in-memory backend.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryBackend {
    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        self.users
            .write()
            .await
            .insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StorageError> {
        Ok(self.users.read().await.get(id).cloned())
    }
}

#[async_trait]
impl ObjectStore for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.objects.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self
            .objects
            .read()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl AvatarStore for MemoryBackend {
    async fn insert_avatar(&self, record: &AvatarRecord) -> Result<(), StorageError> {
        self.avatars
            .write()
            .await
            .insert(record.key.clone(), record.clone());
        Ok(())
    }

    async fn get_avatar(&self, key: &str) -> Result<Option<AvatarRecord>, StorageError> {
        Ok(self.avatars.read().await.get(key).cloned())
    }

    async fn list_avatars(&self, owner_id: &str) -> Result<Vec<AvatarRecord>, StorageError> {
        let mut records: Vec<AvatarRecord> = self
            .avatars
            .read()
            .await
            .values()
            .filter(|r| r.owner_id == owner_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    async fn delete_avatar(&self, key: &str) -> Result<(), StorageError> {
        self.avatars.write().await.remove(key);
        Ok(())
    }
}
