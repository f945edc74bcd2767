//! Local blob store for Focus
//!
//! The local side of reconciliation is a plain key-value store of JSON blobs.
//! Each collection is serialized as a whole under a stable key.

mod local;
mod memory;
mod migrations;
mod sqlite;

use async_trait::async_trait;

use crate::error::Result;

pub use local::{LocalSnapshot, LocalStore};
pub use memory::MemoryBlobStore;
pub use sqlite::LibSqlBlobStore;

/// Key holding the serialized sessions array (newest first)
pub const SESSIONS_KEY: &str = "focus_to_code_sessions_v1";
/// Key holding the serialized interrupts array (newest first)
pub const INTERRUPTS_KEY: &str = "focus_to_code_interrupts_v1";
/// Key holding the latest sync status
pub const SYNC_STATUS_KEY: &str = "focus_to_code_sync_status_v1";

/// String-keyed durable blob storage
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read a blob, `None` when the key was never written
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a blob, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}
