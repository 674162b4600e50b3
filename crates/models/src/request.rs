use serde::{Deserialize, Serialize};

/// A build request as received on the wire. Every field carries the
/// documented default, so an empty JSON object is a valid request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildRequest {
    pub package_name: String,
    pub dependencies: Vec<String>,
    pub runtime: String,
    pub platform: String,
    pub python_version: String,
    pub install_dependencies: bool,
    pub upgrade_packages: bool,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            package_name: "lambda-layer".to_string(),
            dependencies: Vec::new(),
            runtime: "python3.12".to_string(),
            platform: "manylinux2014_x86_64".to_string(),
            python_version: "3.12".to_string(),
            install_dependencies: true,
            upgrade_packages: false,
        }
    }
}

impl BuildRequest {
    /// Whether this build will actually run the installer.
    pub fn wants_install(&self) -> bool {
        self.install_dependencies && !self.dependencies.is_empty()
    }
}
