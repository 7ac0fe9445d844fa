use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{AssetKind, ObjectStore};
use crate::core::error::AppError;

/// In-memory [`ObjectStore`] for tests
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        kind: AssetKind,
        extension: Option<&str>,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let key = format!("public/{}", kind.object_path(extension));
        self.objects.lock().unwrap().insert(key.clone(), data);
        Ok(key)
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.objects.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.objects.lock().unwrap().contains_key(key))
    }

    fn url(&self, key: &str) -> String {
        format!("http://storage.test/bucket/{}", key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::storage::delete_quietly;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_keys_are_filed_by_kind() {
        let store = MemoryStore::default();
        let owner = Uuid::now_v7();
        let key = store
            .put(AssetKind::ResourceFile { owner_id: owner }, Some("pdf"), b"x".to_vec(), "application/pdf")
            .await
            .unwrap();
        assert!(key.starts_with(&format!("public/resources/user_{}/", owner)));
        assert!(key.ends_with(".pdf"));

        let key = store
            .put(AssetKind::CategoryImage, None, b"x".to_vec(), "image/png")
            .await
            .unwrap();
        assert!(key.starts_with("public/categories/"));
    }

    #[tokio::test]
    async fn test_delete_quietly_removes_object() {
        let store = MemoryStore::default();
        let key = store
            .put(AssetKind::GroupImage, Some("png"), b"x".to_vec(), "image/png")
            .await
            .unwrap();
        delete_quietly(&store, Some(&key)).await;
        delete_quietly(&store, None).await;
        assert!(!store.exists(&key).await.unwrap());
        assert_eq!(store.get(&key).await.unwrap(), None);
    }
}
