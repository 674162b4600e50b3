use layer_models::{LayerError, LayerMetadata, LayerSummary, StorageConfig};
use layer_store::{ObjectStore, ObjectSummary};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Read projections over the object store: the layer catalog and the
/// download-URL minter. Holds the storage handle explicitly; nothing here
/// mutates the store.
pub struct LayerRegistry {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) storage: StorageConfig,
}

impl LayerRegistry {
    pub fn new(store: Arc<dyn ObjectStore>, storage: StorageConfig) -> Self {
        Self { store, storage }
    }

    pub(crate) fn presign_expiry(&self) -> Duration {
        Duration::from_secs(self.storage.presign_expiry_secs)
    }

    /// Enumerate stored layers, newest first. Metadata records are the
    /// primary source; when none survive (none exist, or the filter dropped
    /// everything) fall back to a raw listing of the layer prefix with
    /// best-effort per-object metadata.
    #[instrument(skip(self))]
    pub async fn list_layers(&self, search: &str) -> Result<Vec<LayerSummary>, LayerError> {
        let search = search.to_lowercase();
        let mut layers = self.list_from_records(&search).await?;
        if layers.is_empty() {
            layers = self.list_from_raw_objects(&search).await?;
        }

        // RFC 3339 timestamps in a single offset sort lexicographically.
        layers.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        info!("Listed {} layers (search: {:?})", layers.len(), search);
        Ok(layers)
    }

    async fn list_from_records(&self, search: &str) -> Result<Vec<LayerSummary>, LayerError> {
        let prefix = format!("{}/", self.storage.metadata_prefix);
        let mut layers = Vec::new();

        for object in self.store.list_objects(&prefix).await? {
            if !object.key.ends_with(".json") {
                continue;
            }
            let record = match self.store.get_object(&object.key).await {
                Ok(body) => body,
                Err(e) => {
                    warn!("Error reading metadata record {}: {}", object.key, e);
                    continue;
                }
            };
            let metadata: LayerMetadata = match serde_json::from_slice(&record) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!("Error parsing metadata record {}: {}", object.key, e);
                    continue;
                }
            };
            if !metadata.matches_search(search) {
                continue;
            }
            layers.push(summary_from_record(&object, metadata));
        }
        Ok(layers)
    }

    async fn list_from_raw_objects(&self, search: &str) -> Result<Vec<LayerSummary>, LayerError> {
        let prefix = format!("{}/", self.storage.layer_prefix);
        let mut layers = Vec::new();

        for object in self.store.list_objects(&prefix).await? {
            match self.store.head_object(&object.key).await {
                Ok(head) => {
                    if let Some(summary) = summary_from_object(&object, head.metadata, search) {
                        layers.push(summary);
                    }
                }
                Err(e) => {
                    warn!("Error getting metadata for {}: {}", object.key, e);
                    // Without metadata there is nothing to match a filter
                    // against; include the bare entry only for unfiltered
                    // listings.
                    if search.is_empty() {
                        layers.push(bare_summary(&object));
                    }
                }
            }
        }
        Ok(layers)
    }
}

fn file_name_of(key: &str) -> String {
    key.rsplit('/').next().unwrap_or(key).to_string()
}

fn summary_from_record(object: &ObjectSummary, metadata: LayerMetadata) -> LayerSummary {
    LayerSummary {
        key: metadata.package_key,
        size: metadata.package_size,
        last_modified: object.last_modified.to_rfc3339(),
        file_name: metadata.package_name,
        etag: object.etag.clone(),
        dependency_count: metadata.dependencies.len(),
        dependencies: metadata.dependencies,
        runtime: metadata.runtime,
        platform: metadata.platform,
        python_version: metadata.python_version,
        package_type: metadata.package_type,
        install_dependencies: metadata.install_dependencies,
        upgrade_packages: metadata.upgrade_packages,
        created_at: metadata.created_at,
    }
}

/// S3 lowercases user metadata keys; normalize before lookup so records
/// written with camelCase keys resolve either way.
fn summary_from_object(
    object: &ObjectSummary,
    metadata: HashMap<String, String>,
    search: &str,
) -> Option<LayerSummary> {
    let metadata: HashMap<String, String> = metadata
        .into_iter()
        .map(|(k, v)| (k.to_lowercase(), v))
        .collect();
    let get = |key: &str| metadata.get(key).cloned().unwrap_or_default();

    let dependencies: Vec<String> = get("dependencies")
        .split(',')
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty())
        .collect();
    let package_name = metadata
        .get("packagename")
        .cloned()
        .unwrap_or_else(|| file_name_of(&object.key));

    if !search.is_empty()
        && !package_name.to_lowercase().contains(search)
        && !dependencies.join(" ").to_lowercase().contains(search)
    {
        return None;
    }

    Some(LayerSummary {
        key: object.key.clone(),
        size: object.size,
        last_modified: object.last_modified.to_rfc3339(),
        file_name: package_name,
        etag: object.etag.clone(),
        dependency_count: dependencies.len(),
        dependencies,
        runtime: get("runtime"),
        platform: get("platform"),
        python_version: get("pythonversion"),
        package_type: metadata
            .get("packagetype")
            .cloned()
            .unwrap_or_else(|| "layer".to_string()),
        install_dependencies: metadata
            .get("installdependencies")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(true),
        upgrade_packages: metadata
            .get("upgradepackages")
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false),
        created_at: get("createdat"),
    })
}

fn bare_summary(object: &ObjectSummary) -> LayerSummary {
    LayerSummary {
        key: object.key.clone(),
        size: object.size,
        last_modified: object.last_modified.to_rfc3339(),
        file_name: file_name_of(&object.key),
        etag: object.etag.clone(),
        dependencies: Vec::new(),
        runtime: String::new(),
        platform: String::new(),
        python_version: String::new(),
        package_type: "layer".to_string(),
        install_dependencies: false,
        upgrade_packages: false,
        created_at: String::new(),
        dependency_count: 0,
    }
}
