use crate::{prune_installed_tree, zip_directory, PipInstaller, StagingTree};
use chrono::Utc;
use layer_models::{
    BuildRequest, BuildResponse, Config, InstallFailureReason, LayerError, LayerMetadata,
};
use layer_store::{build_timestamp, layer_key, metadata_key, ObjectStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// Builds one layer per call: install into a staging tree, archive, upload,
/// record metadata, presign. Builds are processed synchronously start to
/// finish; concurrent builds never share state because each owns its own
/// staging tree.
pub struct PackageBuilder {
    store: Arc<dyn ObjectStore>,
    installer: PipInstaller,
    config: Config,
}

impl PackageBuilder {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        let installer = PipInstaller::new(config.install.clone());
        Self {
            store,
            installer,
            config,
        }
    }

    #[instrument(skip(self, request), fields(package = %request.package_name))]
    pub async fn build(&self, request: BuildRequest) -> Result<BuildResponse, LayerError> {
        info!(
            "Creating Lambda layer: {} (platform {}, python {}, {} dependencies)",
            request.package_name,
            request.platform,
            request.python_version,
            request.dependencies.len()
        );

        let staging = StagingTree::create()?;

        let dependencies_installed = request.wants_install();
        if dependencies_installed {
            let site_packages = staging.ensure_site_packages(&request.python_version)?;
            let outcome = self
                .installer
                .install(
                    &request.dependencies,
                    &site_packages,
                    staging.root(),
                    &request.platform,
                    &request.python_version,
                    request.upgrade_packages,
                )
                .await?;

            if !outcome.accepted(self.config.install.min_success_ratio) {
                return Err(LayerError::DependencyInstallationFailed {
                    dependencies: request.dependencies.clone(),
                    reason: outcome.reason.unwrap_or(InstallFailureReason::Other),
                });
            }
            prune_installed_tree(&site_packages);
        }

        if !request.dependencies.is_empty() {
            staging.write_manifest(&request.dependencies)?;
        }

        let archive_path = staging.archive_path(&request.package_name);
        let archive = zip_directory(staging.package_dir(), &archive_path)?;

        let timestamp = build_timestamp(Utc::now());
        let s3_key = layer_key(
            &self.config.storage.layer_prefix,
            &request.package_name,
            &timestamp,
        );
        let record_key = metadata_key(
            &self.config.storage.metadata_prefix,
            &request.package_name,
            &timestamp,
        );

        let metadata = LayerMetadata::from_request(
            &request,
            timestamp.clone(),
            s3_key.clone(),
            archive.size,
            archive.sha256.clone(),
        );

        // The archive is complete on local disk before the upload starts,
        // and the metadata record is written only after the archive upload
        // succeeded.
        let body = std::fs::read(&archive_path).map_err(|e| LayerError::Internal {
            reason: format!("failed to read archive: {e}"),
        })?;
        self.store
            .put_object(
                &s3_key,
                body,
                Some("application/zip"),
                metadata.object_metadata(),
            )
            .await?;

        let record = serde_json::to_vec_pretty(&metadata).map_err(|e| LayerError::Internal {
            reason: format!("failed to encode metadata record: {e}"),
        })?;
        self.store
            .put_object(
                &record_key,
                record,
                Some("application/json"),
                HashMap::new(),
            )
            .await?;

        let download_url = self
            .store
            .presign_get(
                &s3_key,
                Duration::from_secs(self.config.storage.presign_expiry_secs),
            )
            .await?;

        info!(
            "Layer {} uploaded as {} ({} bytes)",
            request.package_name, s3_key, archive.size
        );

        Ok(BuildResponse {
            success: true,
            download_url,
            message: format!(
                "Lambda layer \"{}\" created successfully",
                request.package_name
            ),
            package_name: request.package_name,
            s3_key,
            package_type: "layer".to_string(),
            package_size: archive.size,
            platform: request.platform,
            python_version: request.python_version,
            dependencies: request.dependencies,
            dependencies_installed,
            upgrade_packages: request.upgrade_packages,
            created_at: timestamp,
        })
    }
}
