use layer_models::LayerError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Ephemeral filesystem scope for one build. `package/` under the temp root
/// is the archive root; the produced zip lives next to it so it never ends
/// up inside itself. Dropping the tree removes everything, on every exit
/// path.
pub struct StagingTree {
    temp: TempDir,
    package_dir: PathBuf,
}

impl StagingTree {
    pub fn create() -> Result<Self, LayerError> {
        let temp = tempfile::tempdir().map_err(|e| LayerError::Internal {
            reason: format!("failed to create staging directory: {e}"),
        })?;
        let package_dir = temp.path().join("package");
        std::fs::create_dir(&package_dir).map_err(|e| LayerError::Internal {
            reason: format!("failed to create package directory: {e}"),
        })?;
        debug!("Created staging tree at {}", temp.path().display());
        Ok(Self { temp, package_dir })
    }

    /// Temp root; used as the working directory for installer subprocesses
    /// and as the parent of the produced archive.
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Root of the tree that gets archived.
    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    /// Lambda layer convention: `python/lib/python<ver>/site-packages`.
    pub fn site_packages(&self, python_version: &str) -> PathBuf {
        self.package_dir
            .join("python")
            .join("lib")
            .join(format!("python{python_version}"))
            .join("site-packages")
    }

    pub fn ensure_site_packages(&self, python_version: &str) -> Result<PathBuf, LayerError> {
        let target = self.site_packages(python_version);
        std::fs::create_dir_all(&target).map_err(|e| LayerError::Internal {
            reason: format!("failed to create target directory: {e}"),
        })?;
        Ok(target)
    }

    /// Plain-text dependency manifest at the archive root, for traceability.
    pub fn write_manifest(&self, dependencies: &[String]) -> Result<(), LayerError> {
        let path = self.package_dir.join("requirements.txt");
        std::fs::write(&path, dependencies.join("\n")).map_err(|e| LayerError::Internal {
            reason: format!("failed to write requirements.txt: {e}"),
        })
    }

    pub fn archive_path(&self, package_name: &str) -> PathBuf {
        self.temp.path().join(format!("{package_name}.zip"))
    }
}
