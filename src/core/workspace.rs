//! Workspace - the read-only snapshot of the source tree.
//!
//! A workspace is located by walking upward from a starting directory
//! until a `Slipway.toml` with a `[workspace]` table is found, then
//! scanned once for packages. The snapshot never mutates; every CLI
//! invocation constructs a fresh one.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

use crate::core::manifest::{Manifest, WorkspaceConfig, MANIFEST_NAME};
use crate::core::package::Package;

/// Error locating or scanning a workspace.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no workspace found at or above {}", start.display())]
    NotAWorkspace { start: PathBuf },

    #[error("package `{name}` is defined twice: {} and {}", first.display(), second.display())]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to load manifest at {}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to scan workspace")]
    Scan {
        #[from]
        source: walkdir::Error,
    },
}

/// A workspace: root path, configuration, and the discovered packages.
#[derive(Debug)]
pub struct Workspace {
    /// Workspace root directory.
    root: PathBuf,

    /// Configuration from the root manifest.
    config: WorkspaceConfig,

    /// Discovered packages, keyed by name for deterministic iteration.
    packages: BTreeMap<String, Package>,
}

impl Workspace {
    /// Locate the workspace containing `start` and scan it.
    ///
    /// Walks upward from `start` looking for a `Slipway.toml` with a
    /// `[workspace]` table. A manifest with only a `[package]` table is
    /// a package marker, not a root, and the walk continues above it.
    pub fn locate(start: &Path) -> Result<Self, WorkspaceError> {
        let mut current = start.to_path_buf();
        loop {
            let manifest_path = current.join(MANIFEST_NAME);
            if manifest_path.is_file() {
                let manifest =
                    Manifest::load(&manifest_path).map_err(|source| WorkspaceError::Manifest {
                        path: manifest_path.clone(),
                        source,
                    })?;
                if let Some(config) = manifest.workspace {
                    return Self::scan_with(current, config);
                }
            }
            if !current.pop() {
                return Err(WorkspaceError::NotAWorkspace {
                    start: start.to_path_buf(),
                });
            }
        }
    }

    /// Scan a known workspace root.
    ///
    /// Fails with [`WorkspaceError::NotAWorkspace`] if `root` does not
    /// carry a workspace manifest.
    pub fn scan(root: &Path) -> Result<Self, WorkspaceError> {
        let manifest_path = root.join(MANIFEST_NAME);
        if !manifest_path.is_file() {
            return Err(WorkspaceError::NotAWorkspace {
                start: root.to_path_buf(),
            });
        }

        let manifest = Manifest::load(&manifest_path).map_err(|source| WorkspaceError::Manifest {
            path: manifest_path,
            source,
        })?;

        match manifest.workspace {
            Some(config) => Self::scan_with(root.to_path_buf(), config),
            None => Err(WorkspaceError::NotAWorkspace {
                start: root.to_path_buf(),
            }),
        }
    }

    fn scan_with(root: PathBuf, config: WorkspaceConfig) -> Result<Self, WorkspaceError> {
        let build_root = root.join(&config.build_dir);
        let log_root = root.join(&config.log_dir);
        let root_manifest = root.join(MANIFEST_NAME);

        let mut packages: BTreeMap<String, Package> = BTreeMap::new();

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                // Derived artifact trees and hidden directories never
                // contain package sources.
                if entry.path() == build_root || entry.path() == log_root {
                    return false;
                }
                if entry.depth() > 0 && entry.file_type().is_dir() {
                    if let Some(name) = entry.file_name().to_str() {
                        return !name.starts_with('.');
                    }
                }
                true
            });

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || entry.file_name() != MANIFEST_NAME {
                continue;
            }
            if entry.path() == root_manifest {
                continue;
            }

            let manifest =
                Manifest::load(entry.path()).map_err(|source| WorkspaceError::Manifest {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
            let Some(metadata) = manifest.package else {
                continue;
            };

            let pkg_root = entry
                .path()
                .parent()
                .unwrap_or(&root)
                .to_path_buf();
            let name = metadata.name.clone();
            let package = Package::new(
                metadata,
                pkg_root,
                build_root.join(&name),
                log_root.join(&name),
            );

            if let Some(previous) = packages.insert(name.clone(), package) {
                let second = packages
                    .get(&name)
                    .map(|p| p.root().to_path_buf())
                    .unwrap_or_default();
                return Err(WorkspaceError::DuplicatePackage {
                    name,
                    first: previous.root().to_path_buf(),
                    second,
                });
            }
        }

        tracing::debug!(
            "scanned workspace {} ({} packages)",
            root.display(),
            packages.len()
        );

        Ok(Workspace {
            root,
            config,
            packages,
        })
    }

    /// Get the workspace root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the workspace configuration.
    pub fn config(&self) -> &WorkspaceConfig {
        &self.config
    }

    /// Get a package by name.
    pub fn get(&self, name: &str) -> Option<&Package> {
        self.packages.get(name)
    }

    /// Check whether a package with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.packages.contains_key(name)
    }

    /// Iterate over all packages in name order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    /// Get all package names in name order.
    pub fn package_names(&self) -> Vec<&str> {
        self.packages.keys().map(String::as_str).collect()
    }

    /// Get the number of packages.
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Check if the workspace contains no packages.
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_manifest(dir: &Path, contents: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join(MANIFEST_NAME), contents).unwrap();
    }

    fn write_package(root: &Path, rel: &str, name: &str, depends: &[&str]) {
        let deps = depends
            .iter()
            .map(|d| format!("\"{}\"", d))
            .collect::<Vec<_>>()
            .join(", ");
        write_manifest(
            &root.join(rel),
            &format!("[package]\nname = \"{}\"\ndepends = [{}]\n", name, deps),
        );
    }

    #[test]
    fn test_scan_discovers_packages() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "[workspace]\n");
        write_package(tmp.path(), "src/common_msgs", "common_msgs", &[]);
        write_package(tmp.path(), "src/nav/nav_core", "nav_core", &["common_msgs"]);

        let ws = Workspace::scan(tmp.path()).unwrap();
        assert_eq!(ws.len(), 2);
        assert!(ws.contains("common_msgs"));

        let nav = ws.get("nav_core").unwrap();
        assert_eq!(nav.depends(), &["common_msgs".to_string()]);
        assert_eq!(nav.root(), tmp.path().join("src/nav/nav_core"));
        assert_eq!(nav.build_dir(), tmp.path().join("build/nav_core"));
        assert_eq!(nav.log_dir(), tmp.path().join("log/nav_core"));
    }

    #[test]
    fn test_scan_skips_build_and_hidden_dirs() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "[workspace]\n");
        write_package(tmp.path(), "src/real", "real", &[]);
        // Stray manifests under derived/hidden trees must not be picked up.
        write_package(tmp.path(), "build/stale", "stale", &[]);
        write_package(tmp.path(), "log/stale_log", "stale_log", &[]);
        write_package(tmp.path(), ".cache/hidden", "hidden", &[]);

        let ws = Workspace::scan(tmp.path()).unwrap();
        assert_eq!(ws.package_names(), vec!["real"]);
    }

    #[test]
    fn test_locate_walks_upward() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "[workspace]\n");
        write_package(tmp.path(), "src/pkg", "pkg", &[]);

        let nested = tmp.path().join("src/pkg/deep/inner");
        std::fs::create_dir_all(&nested).unwrap();

        let ws = Workspace::locate(&nested).unwrap();
        assert_eq!(ws.root(), tmp.path());
        assert!(ws.contains("pkg"));
    }

    #[test]
    fn test_locate_not_a_workspace() {
        let tmp = TempDir::new().unwrap();
        let result = Workspace::locate(tmp.path());
        assert!(matches!(
            result,
            Err(WorkspaceError::NotAWorkspace { .. })
        ));
    }

    #[test]
    fn test_scan_rejects_duplicate_names() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "[workspace]\n");
        write_package(tmp.path(), "src/a", "dup", &[]);
        write_package(tmp.path(), "src/b", "dup", &[]);

        let result = Workspace::scan(tmp.path());
        assert!(matches!(
            result,
            Err(WorkspaceError::DuplicatePackage { .. })
        ));
    }

    #[test]
    fn test_scan_respects_configured_dirs() {
        let tmp = TempDir::new().unwrap();
        write_manifest(tmp.path(), "[workspace]\nbuild_dir = \"out\"\nlog_dir = \"logs\"\n");
        write_package(tmp.path(), "src/pkg", "pkg", &[]);

        let ws = Workspace::scan(tmp.path()).unwrap();
        let pkg = ws.get("pkg").unwrap();
        assert_eq!(pkg.build_dir(), tmp.path().join("out/pkg"));
        assert_eq!(pkg.log_dir(), tmp.path().join("logs/pkg"));
    }
}
