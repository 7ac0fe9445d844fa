//! Object storage for uploaded resource files and images.
//!
//! Services depend on the [`ObjectStore`] trait; production wires in the
//! MinIO/S3 client, tests use the in-memory store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::core::error::AppError;

mod minio_client;
#[cfg(test)]
mod memory;

pub use minio_client::MinIOClient;
#[cfg(test)]
pub use memory::MemoryStore;

/// Folder an uploaded object is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    CategoryImage,
    GroupImage,
    ProfileImage,
    ResourceFile { owner_id: Uuid },
}

impl AssetKind {
    fn folder(&self) -> String {
        match self {
            AssetKind::CategoryImage => "categories".to_string(),
            AssetKind::GroupImage => "groups".to_string(),
            AssetKind::ProfileImage => "profiles".to_string(),
            AssetKind::ResourceFile { owner_id } => format!("resources/user_{}", owner_id),
        }
    }

    /// Object key relative to the store's public prefix
    pub fn object_path(&self, extension: Option<&str>) -> String {
        match extension {
            Some(ext) => format!("{}/{}.{}", self.folder(), Uuid::now_v7(), ext),
            None => format!("{}/{}", self.folder(), Uuid::now_v7()),
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` under a fresh key for `kind`, returning the full key
    async fn put(
        &self,
        kind: AssetKind,
        extension: Option<&str>,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError>;

    /// `Ok(None)` when the object does not exist
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;

    async fn exists(&self, key: &str) -> Result<bool, AppError>;

    /// Publicly reachable URL for `key`
    fn url(&self, key: &str) -> String;
}

/// Pass `result` through, removing the freshly uploaded `key` when the write
/// that should have referenced it failed.
pub async fn discard_on_error<T>(
    store: &dyn ObjectStore,
    key: Option<&str>,
    result: Result<T, AppError>,
) -> Result<T, AppError> {
    if result.is_err() {
        delete_quietly(store, key).await;
    }
    result
}

/// Delete an object after the owning row is gone. Failures only leave an
/// orphaned object behind, so they are logged instead of returned.
pub async fn delete_quietly(store: &dyn ObjectStore, key: Option<&str>) {
    let Some(key) = key else {
        return;
    };
    if let Err(e) = store.delete(key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete stored object");
    }
}
