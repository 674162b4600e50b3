use serde::{Deserialize, Serialize};

use crate::LayerSummary;

/// Successful build response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildResponse {
    pub success: bool,
    pub download_url: String,
    pub package_name: String,
    pub s3_key: String,
    pub package_type: String,
    pub package_size: u64,
    pub platform: String,
    pub python_version: String,
    pub dependencies: Vec<String>,
    pub dependencies_installed: bool,
    pub upgrade_packages: bool,
    pub created_at: String,
    pub message: String,
}

/// Response of the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub success: bool,
    pub packages: Vec<LayerSummary>,
    pub count: usize,
    pub search_query: String,
}

/// Response of the download-URL endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadResponse {
    pub success: bool,
    pub download_url: String,
    pub s3_key: String,
}
