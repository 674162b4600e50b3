use anyhow::Result;
use layer_api::AppState;
use layer_models::Config;
use layer_packaging::PackageBuilder;
use layer_registry::LayerRegistry;
use layer_store::S3ObjectStore;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

fn load_config() -> Result<Config, Box<dyn std::error::Error>> {
    // Try to load from various config locations
    let config_paths = ["configs/default.toml", "config/config.toml"];

    for path in &config_paths {
        if Path::new(path).exists() {
            return Ok(Config::load(path)?);
        }
    }

    Err("No config file found".into())
}

/// Check that the configured interpreter has a working pip.
async fn is_pip_available(python_bin: &str) -> bool {
    match tokio::process::Command::new(python_bin)
        .args(["-m", "pip", "--version"])
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt().init();

    info!("Starting Layer Forge server");

    // Load configuration from file or use defaults
    let mut config = load_config().unwrap_or_else(|e| {
        warn!("Failed to load config file: {}, using defaults", e);
        Config::default()
    });

    // The hosting environment's bucket wins over the config file.
    if let Ok(bucket) = std::env::var("BUCKET_NAME") {
        config.storage.bucket = bucket;
    }

    info!("Configuration loaded: {:?}", config);

    if !is_pip_available(&config.install.python_bin).await {
        error!(
            "{} -m pip is not available; dependency installation will fail",
            config.install.python_bin
        );
        error!("   Builds without dependencies and the list/download endpoints still work");
    }

    // Object store handle, constructed once and passed into every component
    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let store = Arc::new(S3ObjectStore::new(
        aws_sdk_s3::Client::new(&aws_config),
        config.storage.bucket.clone(),
    ));
    info!("Object store ready (bucket: {})", config.storage.bucket);

    let builder = Arc::new(PackageBuilder::new(store.clone(), config.clone()));
    let registry = Arc::new(LayerRegistry::new(store, config.storage.clone()));
    let state = AppState::new(config.clone(), builder, registry);

    let bind = config.server.bind.clone();
    let port = config.server.port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = layer_api::start_server(bind, port, state).await {
            warn!("API server error: {}", e);
        }
    });

    info!(
        "Layer Forge server started successfully on {}:{}",
        config.server.bind, config.server.port
    );

    // Wait for shutdown signal
    match signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(err) => warn!("Unable to listen for shutdown signal: {}", err),
    }

    info!("Shutting down Layer Forge server...");
    server_handle.abort();
    info!("Layer Forge server shutdown complete");
    Ok(())
}
