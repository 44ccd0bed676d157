use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Audio blob storage.
///
/// `public_url` derives a stable, publicly resolvable URL from the stored
/// object path; there is no signed-URL expiry.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()>;

    /// Removing a missing object is not an error.
    async fn remove(&self, path: &str) -> Result<()>;

    fn public_url(&self, path: &str) -> String;
}

struct StoredObject {
    data: Vec<u8>,
    content_type: String,
}

/// In-process object store.
pub struct MemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<String, StoredObject>>,
}

impl MemoryObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: RwLock::new(HashMap::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects.read().await.contains_key(path)
    }

    pub async fn data_of(&self, path: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(path).map(|o| o.data.clone())
    }

    pub async fn content_type_of(&self, path: &str) -> Option<String> {
        self.objects
            .read()
            .await
            .get(path)
            .map(|o| o.content_type.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(&self, path: &str, data: Vec<u8>, content_type: &str) -> Result<()> {
        self.objects.write().await.insert(
            path.to_string(),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.objects.write().await.remove(path);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}
