use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use layer_models::{
    BuildRequest, BuildResponse, DownloadResponse, ErrorBody, LayerError, ListResponse,
};
use serde::Deserialize;
use tracing::{error, info, instrument};

type ApiError = (StatusCode, Json<ErrorBody>);

fn into_api_error(e: &LayerError) -> ApiError {
    (
        StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        Json(e.to_error_body()),
    )
}

#[instrument(skip(state, payload))]
pub async fn create_package(
    State(state): State<AppState>,
    Json(payload): Json<BuildRequest>,
) -> Result<Json<BuildResponse>, ApiError> {
    info!("Creating package: {}", payload.package_name);

    match state.builder.build(payload).await {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            error!("Failed to create package: {}", e);
            Err(into_api_error(&e))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

#[instrument(skip(state))]
pub async fn list_packages(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<ListResponse>, ApiError> {
    let search = params.search.unwrap_or_default().to_lowercase();

    match state.registry.list_layers(&search).await {
        Ok(packages) => Ok(Json(ListResponse {
            success: true,
            count: packages.len(),
            packages,
            search_query: search,
        })),
        Err(e) => {
            error!("Failed to list packages: {}", e);
            Err(into_api_error(&e))
        }
    }
}

#[instrument(skip(state))]
pub async fn download_package(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DownloadResponse>, ApiError> {
    if key.trim().is_empty() {
        let e = LayerError::InvalidRequest {
            reason: "S3 key is required".to_string(),
        };
        return Err(into_api_error(&e));
    }

    match state.registry.mint_download_url(&key).await {
        Ok(download_url) => Ok(Json(DownloadResponse {
            success: true,
            download_url,
            s3_key: key,
        })),
        Err(e) => {
            error!("Failed to generate download URL for {}: {}", key, e);
            Err(into_api_error(&e))
        }
    }
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy" }))
}
