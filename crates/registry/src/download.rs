use crate::LayerRegistry;
use layer_models::LayerError;
use tracing::{info, instrument};

impl LayerRegistry {
    /// Mint a time-limited signed download URL for an existing archive.
    /// The object is verified to exist first, so an absent key surfaces as
    /// `NotFound` rather than a signed-but-broken URL.
    #[instrument(skip(self))]
    pub async fn mint_download_url(&self, key: &str) -> Result<String, LayerError> {
        self.store.head_object(key).await?;
        let url = self.store.presign_get(key, self.presign_expiry()).await?;
        info!("Generated download URL for {}", key);
        Ok(url)
    }
}
