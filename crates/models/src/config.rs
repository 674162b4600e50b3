use anyhow::Result;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub install: InstallConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub bucket: String,
    pub layer_prefix: String,
    pub metadata_prefix: String,
    pub presign_expiry_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct InstallConfig {
    pub python_bin: String,
    /// Per-package bound in individual mode.
    pub package_timeout_secs: u64,
    /// Bound for the minimal-flag retry of an allow-listed package.
    pub simple_retry_timeout_secs: u64,
    /// Bound for a together-mode batch invocation.
    pub batch_timeout_secs: u64,
    /// Bound for the together-mode minimal-flag retry.
    pub batch_retry_timeout_secs: u64,
    /// Bound for the best-effort pip self-upgrade.
    pub pip_upgrade_timeout_secs: u64,
    /// Above this many dependencies, packages are installed one by one.
    pub batch_threshold: usize,
    /// Minimum fraction of dependencies that must install for the build to
    /// be accepted.
    pub min_success_ratio: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: "0.0.0.0".to_string(),
                port: 8080,
            },
            storage: StorageConfig {
                bucket: "lambda-layers".to_string(),
                layer_prefix: "layers".to_string(),
                metadata_prefix: "metadata".to_string(),
                presign_expiry_secs: 7200, // 2 hours for more reliable downloads
            },
            install: InstallConfig {
                python_bin: "python3".to_string(),
                package_timeout_secs: 300,
                simple_retry_timeout_secs: 180,
                batch_timeout_secs: 600,
                batch_retry_timeout_secs: 300,
                pip_upgrade_timeout_secs: 60,
                batch_threshold: 2,
                min_success_ratio: 0.5,
            },
        }
    }
}

impl Config {
    pub fn load(config_path: &str) -> Result<Self> {
        let config_str = std::fs::read_to_string(config_path)?;
        let config: Config = toml::from_str(&config_str)?;
        Ok(config)
    }
}
