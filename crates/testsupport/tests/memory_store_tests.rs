use layer_models::LayerError;
use layer_store::ObjectStore;
use layer_testsupport::MemoryStore;
use std::collections::HashMap;
use std::time::Duration;

#[tokio::test]
async fn test_put_get_head_roundtrip() {
    let store = MemoryStore::new();
    let metadata = HashMap::from([("packageName".to_string(), "demo".to_string())]);
    store
        .put_object("layers/demo.zip", b"zipbytes".to_vec(), Some("application/zip"), metadata)
        .await
        .unwrap();

    assert_eq!(store.get_object("layers/demo.zip").await.unwrap(), b"zipbytes");

    let head = store.head_object("layers/demo.zip").await.unwrap();
    assert_eq!(head.size, 8);
    assert_eq!(head.metadata["packageName"], "demo");
}

#[tokio::test]
async fn test_absent_keys_are_not_found() {
    let store = MemoryStore::new();
    assert!(matches!(
        store.get_object("nope").await.unwrap_err(),
        LayerError::NotFound { .. }
    ));
    assert!(matches!(
        store.head_object("nope").await.unwrap_err(),
        LayerError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_list_respects_prefix() {
    let store = MemoryStore::new();
    for key in ["layers/a.zip", "layers/b.zip", "metadata/a.json"] {
        store
            .put_object(key, b"x".to_vec(), None, HashMap::new())
            .await
            .unwrap();
    }

    let layers = store.list_objects("layers/").await.unwrap();
    assert_eq!(layers.len(), 2);
    assert!(layers.iter().all(|o| o.key.starts_with("layers/")));

    let records = store.list_objects("metadata/").await.unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_presigned_url_carries_expiry() {
    let store = MemoryStore::new();
    let url = store
        .presign_get("layers/demo.zip", Duration::from_secs(7200))
        .await
        .unwrap();
    assert!(url.contains("layers/demo.zip"));
    assert!(url.contains("X-Amz-Expires=7200"));
}
