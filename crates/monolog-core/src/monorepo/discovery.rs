//! Manifest discovery

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use walkdir::WalkDir;

/// A manifest that could not be read or parsed.
///
/// These are reported alongside the graph and never abort construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestWarning {
    /// Manifest (or directory) that failed
    pub path: PathBuf,
    /// What went wrong
    pub message: String,
}

impl ManifestWarning {
    /// Create a new warning
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ManifestWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Recursively list manifest files named `manifest_name` under `root`,
/// skipping directories whose name is in `exclude_dirs`.
///
/// Results are sorted by path. Unreadable directories become warnings.
pub fn find_manifests(
    root: &Path,
    manifest_name: &str,
    exclude_dirs: &[String],
) -> (Vec<PathBuf>, Vec<ManifestWarning>) {
    debug!(root = %root.display(), manifest_name, "discovering manifests");
    let mut manifests = Vec::new();
    let mut warnings = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            !exclude_dirs.iter().any(|excluded| excluded.as_str() == name)
        });

    for entry in walker {
        match entry {
            Ok(entry) => {
                if entry.file_type().is_file() && entry.file_name() == manifest_name {
                    manifests.push(entry.into_path());
                }
            }
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                warnings.push(ManifestWarning::new(path, e.to_string()));
            }
        }
    }

    manifests.sort();
    info!(count = manifests.len(), warnings = warnings.len(), "discovered manifests");
    (manifests, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "{}").unwrap();
    }

    #[test]
    fn test_find_manifests_skips_excluded() {
        let temp = TempDir::new().unwrap();
        touch(temp.path(), "package.json");
        touch(temp.path(), "packages/core/package.json");
        touch(temp.path(), "packages/app/package.json");
        touch(temp.path(), "packages/app/node_modules/left-pad/package.json");
        touch(temp.path(), "packages/app/src/index.ts");

        let (found, warnings) =
            find_manifests(temp.path(), "package.json", &["node_modules".to_string()]);

        assert!(warnings.is_empty());
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|p| !p.to_string_lossy().contains("node_modules")));
        assert_eq!(found[0], temp.path().join("package.json"));
    }

    #[test]
    fn test_find_manifests_empty_tree() {
        let temp = TempDir::new().unwrap();
        let (found, _) = find_manifests(temp.path(), "package.json", &[]);
        assert!(found.is_empty());
    }
}
