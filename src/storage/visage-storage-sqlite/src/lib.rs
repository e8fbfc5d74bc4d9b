//! # Visage Storage - SQLite Backend
//!
//! SQLite implementation of the Visage storage traits: mirrored user
//! records, avatar metadata, and object blobs in a single database file.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use visage_storage::{
    AvatarRecord, AvatarStore, ObjectStore, StorageError, UserRecord, UserStore,
};

/// Database file name inside the data directory.
const DB_FILE: &str = "visage.db";

/// SQLite storage backend.
///
/// User rows are upserted by subject id, so concurrent provisioning of the
/// same account converges on one row without locking at this layer.
#[derive(Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteBackend {
    /// Opens or creates the database under `base_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created, the connection
    /// fails, or migrations fail.
    pub async fn open(base_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let base = base_path.as_ref();
        std::fs::create_dir_all(base).map_err(|e| {
            StorageError::ConnectionFailed(format!("failed to create directory: {e}"))
        })?;

        let db_path = base.join(DB_FILE);
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        debug!(path = %db_path.display(), "Opening SQLite database");

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        let backend = Self { pool, db_path };

        backend.migrate().await?;

        info!("SQLite backend ready");

        Ok(backend)
    }

    /// Runs database migrations.
    async fn migrate(&self) -> Result<(), StorageError> {
        debug!("Running database migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id         TEXT PRIMARY KEY,
                email      TEXT,
                first_name TEXT,
                last_name  TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("migration failed: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS avatars (
                key          TEXT PRIMARY KEY,
                owner_id     TEXT NOT NULL,
                name         TEXT NOT NULL,
                relationship TEXT NOT NULL,
                content_type TEXT NOT NULL,
                created_at   INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("migration failed: {e}")))?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_avatars_owner ON avatars (owner_id)")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::ConnectionFailed(format!("migration failed: {e}")))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS objects (
                key        TEXT PRIMARY KEY,
                value      BLOB NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::ConnectionFailed(format!("migration failed: {e}")))?;

        debug!("Migrations complete");

        Ok(())
    }

    /// Returns the current Unix timestamp.
    fn now() -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before UNIX epoch")
            .as_secs() as i64
    }
}

#[async_trait]
impl UserStore for SqliteBackend {
    async fn upsert_user(&self, record: &UserRecord) -> Result<(), StorageError> {
        let now = Self::now();

        sqlx::query(
            r#"
            INSERT INTO users (id, email, first_name, last_name, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                email = excluded.email,
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.id)
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn get_user(&self, id: &str) -> Result<Option<UserRecord>, StorageError> {
        let row: Option<(String, Option<String>, Option<String>, Option<String>)> =
            sqlx::query_as("SELECT id, email, first_name, last_name FROM users WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(row.map(|(id, email, first_name, last_name)| UserRecord {
            id,
            email,
            first_name,
            last_name,
        }))
    }
}

#[async_trait]
impl ObjectStore for SqliteBackend {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let row: Option<(Vec<u8>,)> = sqlx::query_as("SELECT value FROM objects WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(row.map(|(v,)| v))
    }

    async fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let now = Self::now();

        sqlx::query(
            r#"
            INSERT INTO objects (key, value, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM objects WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let pattern = format!("{prefix}%");

        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT key FROM objects WHERE key LIKE ? ORDER BY key")
                .bind(&pattern)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(|(k,)| k).collect())
    }
}

type AvatarRow = (String, String, String, String, String, i64);

fn avatar_from_row(row: AvatarRow) -> AvatarRecord {
    let (key, owner_id, name, relationship, content_type, created_at) = row;
    AvatarRecord {
        key,
        owner_id,
        name,
        relationship,
        content_type,
        created_at,
    }
}

#[async_trait]
impl AvatarStore for SqliteBackend {
    async fn insert_avatar(&self, record: &AvatarRecord) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO avatars (key, owner_id, name, relationship, content_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.key)
        .bind(&record.owner_id)
        .bind(&record.name)
        .bind(&record.relationship)
        .bind(&record.content_type)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }

    async fn get_avatar(&self, key: &str) -> Result<Option<AvatarRecord>, StorageError> {
        let row: Option<AvatarRow> = sqlx::query_as(
            "SELECT key, owner_id, name, relationship, content_type, created_at \
             FROM avatars WHERE key = ?",
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(row.map(avatar_from_row))
    }

    async fn list_avatars(&self, owner_id: &str) -> Result<Vec<AvatarRecord>, StorageError> {
        let rows: Vec<AvatarRow> = sqlx::query_as(
            "SELECT key, owner_id, name, relationship, content_type, created_at \
             FROM avatars WHERE owner_id = ? ORDER BY created_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(rows.into_iter().map(avatar_from_row).collect())
    }

    async fn delete_avatar(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM avatars WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn setup() -> (TempDir, SqliteBackend) {
        let tmp = TempDir::new().unwrap();
        let backend = SqliteBackend::open(tmp.path()).await.unwrap();
        (tmp, backend)
    }

    fn user(id: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            email: Some(format!("{id}@example.com")),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        }
    }

    #[tokio::test]
    async fn test_open_creates_db() {
        let tmp = TempDir::new().unwrap();
        let _backend = SqliteBackend::open(tmp.path()).await.unwrap();

        assert!(tmp.path().join(DB_FILE).exists());
    }

    #[tokio::test]
    async fn test_user_upsert_and_update() {
        let (_tmp, backend) = setup().await;

        backend.upsert_user(&user("u1")).await.unwrap();

        let mut updated = user("u1");
        updated.email = Some("changed@example.com".to_string());
        backend.upsert_user(&updated).await.unwrap();

        let fetched = backend.get_user("u1").await.unwrap().unwrap();
        assert_eq!(fetched.email, Some("changed@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_get_user_missing() {
        let (_tmp, backend) = setup().await;
        assert!(backend.get_user("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_object_roundtrip() {
        let (_tmp, backend) = setup().await;

        backend.put("u1/a.png", b"avatar-bytes").await.unwrap();
        assert_eq!(
            backend.get("u1/a.png").await.unwrap(),
            Some(b"avatar-bytes".to_vec())
        );

        backend.delete("u1/a.png").await.unwrap();
        assert_eq!(backend.get("u1/a.png").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_object_list_by_prefix() {
        let (_tmp, backend) = setup().await;

        backend.put("u1/a.png", b"a").await.unwrap();
        backend.put("u1/b.png", b"b").await.unwrap();
        backend.put("u2/c.png", b"c").await.unwrap();

        let keys = backend.list("u1/").await.unwrap();
        assert_eq!(keys, vec!["u1/a.png".to_string(), "u1/b.png".to_string()]);
    }

    #[tokio::test]
    async fn test_avatar_records() {
        let (_tmp, backend) = setup().await;

        let record = AvatarRecord {
            key: "u1/2024-x.png".to_string(),
            owner_id: "u1".to_string(),
            name: "Grandma".to_string(),
            relationship: "family".to_string(),
            content_type: "image/png".to_string(),
            created_at: 1,
        };
        backend.insert_avatar(&record).await.unwrap();

        assert_eq!(
            backend.get_avatar("u1/2024-x.png").await.unwrap(),
            Some(record.clone())
        );
        assert_eq!(backend.list_avatars("u1").await.unwrap(), vec![record]);
        assert!(backend.list_avatars("u2").await.unwrap().is_empty());

        backend.delete_avatar("u1/2024-x.png").await.unwrap();
        assert!(backend.get_avatar("u1/2024-x.png").await.unwrap().is_none());
    }
}
