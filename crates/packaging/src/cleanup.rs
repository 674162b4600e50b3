use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Directory names pruned from an installed tree.
const PRUNE_DIRS: &[&str] = &["__pycache__", "tests", "test", "docs", "examples"];

fn is_prunable_dir(name: &str) -> bool {
    PRUNE_DIRS.contains(&name)
}

fn is_prunable_file(name: &str) -> bool {
    name.ends_with(".pyc") || name.ends_with(".pyo")
}

/// Remove bytecode caches and documentation/test directories from an
/// installed tree to shrink the archive. Advisory hygiene: every failure is
/// logged and swallowed, never escalated into the build's outcome.
pub fn prune_installed_tree(target_dir: &Path) {
    if !target_dir.is_dir() {
        return;
    }

    let mut dirs: Vec<PathBuf> = Vec::new();
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(target_dir).into_iter().filter_map(|e| e.ok()) {
        let name = entry.file_name().to_string_lossy().into_owned();
        if entry.file_type().is_dir() && is_prunable_dir(&name) {
            dirs.push(entry.into_path());
        } else if entry.file_type().is_file() && is_prunable_file(&name) {
            files.push(entry.into_path());
        }
    }

    let mut removed = 0usize;
    for dir in dirs {
        // May already be gone as part of a parent pruned earlier.
        if !dir.exists() {
            continue;
        }
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not prune {}: {}", dir.display(), e),
        }
    }
    for file in files {
        if !file.exists() {
            continue;
        }
        match std::fs::remove_file(&file) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Could not prune {}: {}", file.display(), e),
        }
    }

    info!(
        "Cleaned up installation directory: {} ({} entries pruned)",
        target_dir.display(),
        removed
    );
}
