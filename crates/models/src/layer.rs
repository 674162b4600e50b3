use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::BuildRequest;

/// The durable metadata record stored next to each archive
/// (`metadata/<name>-<timestamp>.json`). A superset of the object-level
/// metadata map attached to the archive itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerMetadata {
    pub package_name: String,
    pub dependencies: Vec<String>,
    pub runtime: String,
    pub platform: String,
    pub python_version: String,
    pub package_type: String,
    pub install_dependencies: bool,
    pub upgrade_packages: bool,
    pub created_at: String,
    pub package_key: String,
    pub package_size: u64,
    #[serde(default)]
    pub sha256: String,
}

impl LayerMetadata {
    pub fn from_request(
        request: &BuildRequest,
        created_at: String,
        package_key: String,
        package_size: u64,
        sha256: String,
    ) -> Self {
        Self {
            package_name: request.package_name.clone(),
            dependencies: request.dependencies.clone(),
            runtime: request.runtime.clone(),
            platform: request.platform.clone(),
            python_version: request.python_version.clone(),
            package_type: "layer".to_string(),
            install_dependencies: request.install_dependencies,
            upgrade_packages: request.upgrade_packages,
            created_at,
            package_key,
            package_size,
            sha256,
        }
    }

    /// The flat string map attached to the archive object itself. S3
    /// lowercases these keys on the way back out, so readers must not rely
    /// on the casing used here.
    pub fn object_metadata(&self) -> HashMap<String, String> {
        HashMap::from([
            ("packageName".to_string(), self.package_name.clone()),
            ("dependencies".to_string(), self.dependencies.join(",")),
            ("runtime".to_string(), self.runtime.clone()),
            ("platform".to_string(), self.platform.clone()),
            ("pythonVersion".to_string(), self.python_version.clone()),
            ("packageType".to_string(), self.package_type.clone()),
            (
                "installDependencies".to_string(),
                self.install_dependencies.to_string(),
            ),
            (
                "upgradePackages".to_string(),
                self.upgrade_packages.to_string(),
            ),
            ("createdAt".to_string(), self.created_at.clone()),
            (
                "dependencyCount".to_string(),
                self.dependencies.len().to_string(),
            ),
            ("sha256".to_string(), self.sha256.clone()),
        ])
    }

    /// Case-insensitive substring match over the package name and the joined
    /// dependency list. An empty query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.package_name.to_lowercase().contains(&query)
            || self.dependencies.join(" ").to_lowercase().contains(&query)
    }
}

/// One entry of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LayerSummary {
    pub key: String,
    pub size: u64,
    pub last_modified: String,
    pub file_name: String,
    pub etag: String,
    pub dependencies: Vec<String>,
    pub runtime: String,
    pub platform: String,
    pub python_version: String,
    pub package_type: String,
    pub install_dependencies: bool,
    pub upgrade_packages: bool,
    pub created_at: String,
    pub dependency_count: usize,
}
