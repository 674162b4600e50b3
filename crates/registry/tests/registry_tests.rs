use chrono::{TimeZone, Utc};
use layer_models::{Config, LayerError, LayerMetadata};
use layer_registry::LayerRegistry;
use layer_store::ObjectStore;
use layer_testsupport::{build_request, MemoryStore};
use std::collections::HashMap;
use std::sync::Arc;

fn registry(store: &MemoryStore) -> LayerRegistry {
    LayerRegistry::new(Arc::new(store.clone()), Config::default().storage)
}

/// Store an archive plus its metadata record, as a build would.
async fn seed_layer(
    store: &MemoryStore,
    name: &str,
    dependencies: &[&str],
    timestamp: &str,
) -> (String, String) {
    let request = build_request(name, dependencies);
    let key = format!("layers/{name}-{timestamp}.zip");
    let record_key = format!("metadata/{name}-{timestamp}.json");
    let metadata = LayerMetadata::from_request(
        &request,
        timestamp.to_string(),
        key.clone(),
        3,
        "abc123".to_string(),
    );

    store
        .put_object(
            &key,
            b"zip".to_vec(),
            Some("application/zip"),
            metadata.object_metadata(),
        )
        .await
        .unwrap();
    store
        .put_object(
            &record_key,
            serde_json::to_vec(&metadata).unwrap(),
            Some("application/json"),
            HashMap::new(),
        )
        .await
        .unwrap();
    (key, record_key)
}

#[tokio::test]
async fn test_list_is_sorted_newest_first() {
    let store = MemoryStore::new();
    let (_, old_record) = seed_layer(&store, "older", &["six"], "20250101-000000").await;
    let (_, new_record) = seed_layer(&store, "newer", &["requests"], "20250601-000000").await;

    store
        .set_last_modified(&old_record, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
        .await;
    store
        .set_last_modified(&new_record, Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap())
        .await;

    let layers = registry(&store).list_layers("").await.unwrap();
    assert_eq!(layers.len(), 2);
    assert_eq!(layers[0].file_name, "newer");
    assert_eq!(layers[1].file_name, "older");
    assert_eq!(layers[0].key, "layers/newer-20250601-000000.zip");
    assert_eq!(layers[0].dependencies, vec!["requests"]);
    assert_eq!(layers[0].dependency_count, 1);
    assert_eq!(layers[0].package_type, "layer");
}

#[tokio::test]
async fn test_search_matches_name_and_dependencies() {
    let store = MemoryStore::new();
    seed_layer(&store, "web-stack", &["requests", "urllib3"], "20250101-000000").await;
    seed_layer(&store, "data-stack", &["numpy"], "20250101-000001").await;

    let registry = registry(&store);

    let by_name = registry.list_layers("WEB").await.unwrap();
    assert_eq!(by_name.len(), 1);
    assert_eq!(by_name[0].file_name, "web-stack");

    let by_dependency = registry.list_layers("numpy").await.unwrap();
    assert_eq!(by_dependency.len(), 1);
    assert_eq!(by_dependency[0].file_name, "data-stack");

    let no_match = registry.list_layers("flask").await.unwrap();
    assert!(no_match.is_empty());
}

#[tokio::test]
async fn test_raw_listing_fallback_reads_object_metadata() {
    let store = MemoryStore::new();
    // An archive uploaded without a metadata record (pre-record era).
    let request = build_request("legacy", &["six", "boto3"]);
    let metadata = LayerMetadata::from_request(
        &request,
        "20240101-000000".to_string(),
        "layers/legacy-20240101-000000.zip".to_string(),
        3,
        String::new(),
    );
    store
        .put_object(
            "layers/legacy-20240101-000000.zip",
            b"zip".to_vec(),
            Some("application/zip"),
            metadata.object_metadata(),
        )
        .await
        .unwrap();

    let layers = registry(&store).list_layers("").await.unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].file_name, "legacy");
    assert_eq!(layers[0].dependencies, vec!["six", "boto3"]);
    assert_eq!(layers[0].runtime, "python3.12");
    assert!(layers[0].install_dependencies);

    // The same fallback honors the search filter.
    let filtered = registry(&store).list_layers("boto3").await.unwrap();
    assert_eq!(filtered.len(), 1);
    let excluded = registry(&store).list_layers("flask").await.unwrap();
    assert!(excluded.is_empty());
}

#[tokio::test]
async fn test_fallback_without_metadata_uses_key_name() {
    let store = MemoryStore::new();
    store
        .put_object(
            "layers/mystery-20240101-000000.zip",
            b"zip".to_vec(),
            Some("application/zip"),
            HashMap::new(),
        )
        .await
        .unwrap();

    let layers = registry(&store).list_layers("").await.unwrap();
    assert_eq!(layers.len(), 1);
    assert_eq!(layers[0].file_name, "mystery-20240101-000000.zip");
    assert!(layers[0].dependencies.is_empty());
    assert_eq!(layers[0].dependency_count, 0);
}

#[tokio::test]
async fn test_mint_download_url() {
    let store = MemoryStore::new();
    let (key, _) = seed_layer(&store, "demo", &["six"], "20250101-000000").await;

    let url = registry(&store).mint_download_url(&key).await.unwrap();
    assert!(url.contains(&key));

    let err = registry(&store)
        .mint_download_url("layers/absent.zip")
        .await
        .unwrap_err();
    assert!(matches!(err, LayerError::NotFound { .. }));
    assert_eq!(err.http_status(), 404);
}
