use async_trait::async_trait;
use chrono::{DateTime, Utc};
use layer_models::LayerError;
use layer_store::{ObjectHead, ObjectStore, ObjectSummary};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    metadata: HashMap<String, String>,
    last_modified: DateTime<Utc>,
}

/// In-memory `ObjectStore` for hermetic tests. Presigned URLs are fake but
/// stable, and `set_last_modified` lets recency-ordering tests control the
/// clock.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<BTreeMap<String, StoredObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.lock().await.contains_key(key)
    }

    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }

    pub async fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|object| object.body.clone())
    }

    pub async fn set_last_modified(&self, key: &str, last_modified: DateTime<Utc>) {
        if let Some(object) = self.objects.lock().await.get_mut(key) {
            object.last_modified = last_modified;
        }
    }
}

fn etag_for(body: &[u8]) -> String {
    // Cheap stand-in for a content hash; only equality matters in tests.
    format!("len-{}", body.len())
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        _content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), LayerError> {
        self.objects.lock().await.insert(
            key.to_string(),
            StoredObject {
                body,
                metadata,
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn get_object(&self, key: &str) -> Result<Vec<u8>, LayerError> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|object| object.body.clone())
            .ok_or_else(|| LayerError::NotFound {
                key: key.to_string(),
            })
    }

    async fn head_object(&self, key: &str) -> Result<ObjectHead, LayerError> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|object| ObjectHead {
                size: object.body.len() as u64,
                last_modified: object.last_modified,
                etag: etag_for(&object.body),
                metadata: object.metadata.clone(),
            })
            .ok_or_else(|| LayerError::NotFound {
                key: key.to_string(),
            })
    }

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, LayerError> {
        Ok(self
            .objects
            .lock()
            .await
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| ObjectSummary {
                key: key.clone(),
                size: object.body.len() as u64,
                last_modified: object.last_modified,
                etag: etag_for(&object.body),
            })
            .collect())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, LayerError> {
        Ok(format!(
            "https://memory-store.invalid/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}
