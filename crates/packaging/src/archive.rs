use layer_models::LayerError;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::Path;
use tracing::info;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone)]
pub struct ArchiveInfo {
    pub size: u64,
    pub sha256: String,
}

/// Zip the contents of `src_dir` into `zip_path`. Member names are relative
/// to `src_dir` (no absolute paths leak into the archive), the walk order is
/// sorted so the same tree always produces the same member sequence, and
/// deflate runs at maximum compression.
pub fn zip_directory(src_dir: &Path, zip_path: &Path) -> Result<ArchiveInfo, LayerError> {
    let file = File::create(zip_path).map_err(|e| LayerError::Internal {
        reason: format!("failed to create archive: {e}"),
    })?;
    let mut zip = ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    for entry in WalkDir::new(src_dir).sort_by_file_name() {
        let entry = entry.map_err(|e| LayerError::Internal {
            reason: format!("failed to walk staging tree: {e}"),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(|e| LayerError::Internal {
                reason: format!("path escapes staging tree: {e}"),
            })?;
        let name = relative.to_string_lossy().replace('\\', "/");

        zip.start_file(name, options).map_err(|e| LayerError::Internal {
            reason: format!("failed to add archive entry: {e}"),
        })?;
        let mut source = File::open(entry.path()).map_err(|e| LayerError::Internal {
            reason: format!("failed to read {}: {e}", entry.path().display()),
        })?;
        std::io::copy(&mut source, &mut zip).map_err(|e| LayerError::Internal {
            reason: format!("failed to write archive entry: {e}"),
        })?;
    }

    zip.finish().map_err(|e| LayerError::Internal {
        reason: format!("failed to finish archive: {e}"),
    })?;

    let data = std::fs::read(zip_path).map_err(|e| LayerError::Internal {
        reason: format!("failed to read back archive: {e}"),
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    let info = ArchiveInfo {
        size: data.len() as u64,
        sha256: format!("{:x}", hasher.finalize()),
    };

    info!(
        "Created ZIP package: {} ({} bytes, sha256 {})",
        zip_path.display(),
        info.size,
        info.sha256
    );
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    fn touch(path: &Path, content: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn member_names(zip_path: &Path) -> Vec<String> {
        let file = File::open(zip_path).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        archive.file_names().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_members_are_relative_to_root() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("package");
        touch(&root.join("requirements.txt"), b"six");
        touch(
            &root.join("python/lib/python3.12/site-packages/six.py"),
            b"# six",
        );

        let zip_path = dir.path().join("demo.zip");
        let info = zip_directory(&root, &zip_path).unwrap();
        assert!(info.size > 0);
        assert_eq!(info.sha256.len(), 64);

        let names = member_names(&zip_path);
        assert!(names.contains(&"requirements.txt".to_string()));
        assert!(names.contains(&"python/lib/python3.12/site-packages/six.py".to_string()));
        assert!(names.iter().all(|n| !n.starts_with('/')));
    }

    #[test]
    fn test_empty_tree_produces_valid_empty_archive() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("package");
        std::fs::create_dir(&root).unwrap();

        let zip_path = dir.path().join("empty.zip");
        zip_directory(&root, &zip_path).unwrap();

        let file = File::open(&zip_path).unwrap();
        let archive = ZipArchive::new(file).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_deterministic_for_same_tree() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("package");
        touch(&root.join("b.txt"), b"bbb");
        touch(&root.join("a.txt"), b"aaa");

        let first = zip_directory(&root, &dir.path().join("one.zip")).unwrap();
        let second = zip_directory(&root, &dir.path().join("two.zip")).unwrap();
        assert_eq!(first.sha256, second.sha256);
    }

    #[test]
    fn test_content_survives() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("package");
        touch(&root.join("requirements.txt"), b"six\nrequests");

        let zip_path = dir.path().join("demo.zip");
        zip_directory(&root, &zip_path).unwrap();

        let file = File::open(&zip_path).unwrap();
        let mut archive = ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name("requirements.txt").unwrap();
        let mut content = String::new();
        entry.read_to_string(&mut content).unwrap();
        assert_eq!(content, "six\nrequests");
    }
}
