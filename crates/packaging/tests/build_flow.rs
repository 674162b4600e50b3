use layer_models::{BuildRequest, Config};
use layer_packaging::PackageBuilder;
use layer_store::ObjectStore;
use layer_testsupport::{parse_metadata, zip_member_content, zip_member_names, MemoryStore};
use std::sync::Arc;

fn builder_with(store: &MemoryStore) -> PackageBuilder {
    PackageBuilder::new(Arc::new(store.clone()), Config::default())
}

#[tokio::test]
async fn test_empty_dependency_build_produces_bare_archive() {
    let store = MemoryStore::new();
    let builder = builder_with(&store);

    let response = builder.build(BuildRequest::default()).await.unwrap();

    assert!(response.success);
    assert!(!response.dependencies_installed);
    assert_eq!(response.package_type, "layer");
    assert!(response.s3_key.starts_with("layers/lambda-layer-"));
    assert!(response.s3_key.ends_with(".zip"));
    assert!(response.download_url.contains(&response.s3_key));
    assert_eq!(
        response.message,
        "Lambda layer \"lambda-layer\" created successfully"
    );

    let archive = store.body(&response.s3_key).await.unwrap();
    let names = zip_member_names(&archive).unwrap();
    assert!(names.is_empty(), "expected no manifest, got {names:?}");
}

#[tokio::test]
async fn test_uninstalled_dependencies_still_get_a_manifest() {
    let store = MemoryStore::new();
    let builder = builder_with(&store);

    let request = BuildRequest {
        package_name: "demo".to_string(),
        dependencies: vec!["six".to_string(), "requests==2.31.0".to_string()],
        install_dependencies: false,
        ..BuildRequest::default()
    };
    let response = builder.build(request).await.unwrap();

    assert!(response.success);
    assert!(!response.dependencies_installed);

    let archive = store.body(&response.s3_key).await.unwrap();
    let names = zip_member_names(&archive).unwrap();
    assert_eq!(names, vec!["requirements.txt"]);
    assert_eq!(
        zip_member_content(&archive, "requirements.txt").unwrap(),
        "six\nrequests==2.31.0"
    );
}

#[tokio::test]
async fn test_metadata_record_mirrors_the_build() {
    let store = MemoryStore::new();
    let builder = builder_with(&store);

    let request = BuildRequest {
        package_name: "demo".to_string(),
        dependencies: vec!["six".to_string()],
        install_dependencies: false,
        ..BuildRequest::default()
    };
    let response = builder.build(request).await.unwrap();

    let record_key = response.s3_key.replace("layers/", "metadata/").replace(".zip", ".json");
    let metadata = parse_metadata(&store.body(&record_key).await.unwrap()).unwrap();

    assert_eq!(metadata.package_name, "demo");
    assert_eq!(metadata.dependencies, vec!["six"]);
    assert_eq!(metadata.package_key, response.s3_key);
    assert_eq!(metadata.package_size, response.package_size);
    assert_eq!(metadata.created_at, response.created_at);
    assert_eq!(metadata.sha256.len(), 64);

    // The archive object carries the flat metadata map.
    let head = store.head_object(&response.s3_key).await.unwrap();
    assert_eq!(head.metadata["packageName"], "demo");
    assert_eq!(head.metadata["dependencyCount"], "1");
}
