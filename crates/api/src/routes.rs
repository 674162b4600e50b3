use crate::{handlers::*, AppState};
use axum::{
    routing::{get, post},
    Router,
};

pub fn create_router() -> Router<AppState> {
    Router::new()
        // Package building and listing
        .route("/packages", post(create_package))
        .route("/packages", get(list_packages))
        // Download-URL minting (keys contain slashes)
        .route("/packages/download/*key", get(download_package))
        // Health
        .route("/healthz", get(health_check))
}

pub fn build_router(state: AppState) -> Router {
    create_router().with_state(state)
}
