use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use layer_api::{build_router, AppState};
use layer_models::Config;
use layer_packaging::PackageBuilder;
use layer_registry::LayerRegistry;
use layer_testsupport::{zip_member_content, zip_member_names, MemoryStore};
use std::sync::Arc;
use tower::util::ServiceExt;

fn app(store: &MemoryStore) -> axum::Router {
    let config = Config::default();
    let store = Arc::new(store.clone());
    let state = AppState::new(
        config.clone(),
        Arc::new(PackageBuilder::new(store.clone(), config.clone())),
        Arc::new(LayerRegistry::new(store, config.storage)),
    );
    build_router(state)
}

async fn post_build(store: &MemoryStore, body: &str) -> (StatusCode, serde_json::Value) {
    let res = app(store)
        .oneshot(
            Request::post("/packages")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

async fn get_json(store: &MemoryStore, uri: &str) -> (StatusCode, serde_json::Value) {
    let res = app(store)
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn build_without_dependencies_produces_empty_archive() {
    let store = MemoryStore::new();
    let (status, json) = post_build(&store, "{}").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["packageName"], "lambda-layer");
    assert_eq!(json["packageType"], "layer");
    assert_eq!(json["dependenciesInstalled"], false);

    let key = json["s3Key"].as_str().unwrap();
    assert!(key.starts_with("layers/lambda-layer-"));

    let archive = store.body(key).await.unwrap();
    assert!(zip_member_names(&archive).unwrap().is_empty());
}

#[tokio::test]
async fn build_list_search_download_roundtrip() {
    let store = MemoryStore::new();

    let (status, json) = post_build(
        &store,
        r#"{"packageName": "demo", "dependencies": ["six"], "installDependencies": false}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["dependencies"], serde_json::json!(["six"]));
    assert_eq!(json["dependenciesInstalled"], false);
    let key = json["s3Key"].as_str().unwrap().to_string();
    assert!(json["downloadUrl"].as_str().unwrap().contains(&key));

    // The archive carries the manifest for traceability even though nothing
    // was installed.
    let archive = store.body(&key).await.unwrap();
    assert_eq!(
        zip_member_content(&archive, "requirements.txt").unwrap(),
        "six"
    );

    // List
    let (status, json) = get_json(&store, "/packages").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["count"], 1);
    assert_eq!(json["packages"][0]["fileName"], "demo");
    assert_eq!(json["packages"][0]["key"], key);

    // Search hit and miss
    let (_, json) = get_json(&store, "/packages?search=SIX").await;
    assert_eq!(json["count"], 1);
    assert_eq!(json["searchQuery"], "six");
    let (_, json) = get_json(&store, "/packages?search=flask").await;
    assert_eq!(json["count"], 0);

    // Download URL minting
    let (status, json) = get_json(&store, &format!("/packages/download/{key}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["s3Key"], key);
    assert!(json["downloadUrl"].as_str().unwrap().contains(&key));

    // Absent keys are a 404 error shape, never a broken URL
    let (status, json) = get_json(&store, "/packages/download/layers/absent.zip").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn malformed_body_is_rejected() {
    let store = MemoryStore::new();
    let res = app(&store)
        .oneshot(
            Request::post("/packages")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
