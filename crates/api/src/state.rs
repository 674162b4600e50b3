use layer_models::Config;
use layer_packaging::PackageBuilder;
use layer_registry::LayerRegistry;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub builder: Arc<PackageBuilder>,
    pub registry: Arc<LayerRegistry>,
}

impl AppState {
    pub fn new(config: Config, builder: Arc<PackageBuilder>, registry: Arc<LayerRegistry>) -> Self {
        Self {
            config,
            builder,
            registry,
        }
    }
}
