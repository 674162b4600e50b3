use async_trait::async_trait;
use chrono::{DateTime, Utc};
use layer_models::LayerError;
use std::collections::HashMap;
use std::time::Duration;

/// One object as returned by a prefix listing.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}

/// Result of a head request.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectHead {
    pub size: u64,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
    pub metadata: HashMap<String, String>,
}

/// Durable blob storage with per-object metadata and time-limited signed
/// download URLs. Constructed once and passed around as an explicit handle;
/// implementations must be safe to share across tasks.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: HashMap<String, String>,
    ) -> Result<(), LayerError>;

    /// Absent keys are `LayerError::NotFound`.
    async fn get_object(&self, key: &str) -> Result<Vec<u8>, LayerError>;

    /// Absent keys are `LayerError::NotFound`.
    async fn head_object(&self, key: &str) -> Result<ObjectHead, LayerError>;

    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>, LayerError>;

    async fn presign_get(&self, key: &str, expires_in: Duration) -> Result<String, LayerError>;
}
