//! libSQL-backed blob store

use std::path::Path;

use async_trait::async_trait;
use libsql::{params, Builder, Connection, Database};

use super::{migrations, BlobStore};
use crate::error::Result;

/// Blob store persisted in a local libSQL (`SQLite`) file
pub struct LibSqlBlobStore {
    // Dropping the database handle closes the connection.
    _db: Database,
    conn: Connection,
}

impl LibSqlBlobStore {
    /// Open a store at the given path, creating it if it doesn't exist
    ///
    /// Runs migrations automatically.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();
        let db = Builder::new_local(&path_str).build().await?;
        Self::from_database(db).await
    }

    /// Open an in-memory store (useful for testing)
    pub async fn open_in_memory() -> Result<Self> {
        let db = Builder::new_local(":memory:").build().await?;
        Self::from_database(db).await
    }

    async fn from_database(db: Database) -> Result<Self> {
        let conn = db.connect()?;
        conn.execute("PRAGMA journal_mode = WAL;", ())
            .await
            .ok(); // Not available for in-memory databases
        migrations::run(&conn).await?;
        Ok(Self { _db: db, conn })
    }
}

#[async_trait]
impl BlobStore for LibSqlBlobStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM kv_blobs WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            Ok(Some(row.get::<String>(0)?))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn
            .execute(
                "INSERT INTO kv_blobs (key, value, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                params![key, value, now],
            )
            .await?;
        Ok(())
    }
}
