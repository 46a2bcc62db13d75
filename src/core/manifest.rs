//! Slipway.toml manifest parsing and schema.
//!
//! The same file name serves two roles: the workspace root carries a
//! `[workspace]` table, and each package directory carries a `[package]`
//! table. A manifest with neither table is rejected.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::backend::BuildType;

/// File name of the manifest, for both the workspace root and packages.
pub const MANIFEST_NAME: &str = "Slipway.toml";

/// Package metadata from the `[package]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageMetadata {
    /// Package name, unique within the workspace.
    pub name: String,

    /// Optional human-readable description.
    #[serde(default)]
    pub description: Option<String>,

    /// Names of packages this package depends on, in declared order.
    /// Names that do not resolve inside the workspace are ignored.
    #[serde(default)]
    pub depends: Vec<String>,
}

/// Workspace configuration from the `[workspace]` table at the root.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Directory under the root holding per-package build trees.
    pub build_dir: String,

    /// Directory under the root holding per-package build logs.
    pub log_dir: String,

    /// Default worker limit for parallel builds.
    pub jobs: Option<usize>,

    /// Default CMake build type when the CLI does not specify one.
    pub build_type: Option<BuildType>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        WorkspaceConfig {
            build_dir: "build".to_string(),
            log_dir: "log".to_string(),
            jobs: None,
            build_type: None,
        }
    }
}

/// The parsed Slipway.toml manifest.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Package metadata (absent at the workspace root).
    pub package: Option<PackageMetadata>,

    /// Workspace configuration (absent in package directories).
    pub workspace: Option<WorkspaceConfig>,
}

impl Manifest {
    /// Load a manifest from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read manifest: {}", path.display()))?;

        let manifest: Manifest = toml::from_str(&contents)
            .with_context(|| format!("failed to parse manifest: {}", path.display()))?;

        manifest
            .validate()
            .with_context(|| format!("invalid manifest: {}", path.display()))?;

        Ok(manifest)
    }

    /// Check whether this manifest marks a workspace root.
    pub fn is_workspace_root(&self) -> bool {
        self.workspace.is_some()
    }

    fn validate(&self) -> Result<()> {
        if self.package.is_none() && self.workspace.is_none() {
            bail!("manifest must contain a [package] or [workspace] table");
        }

        if let Some(ref package) = self.package {
            if package.name.is_empty() {
                bail!("package name must not be empty");
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_package_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(
            &path,
            r#"
[package]
name = "nav_core"
description = "navigation core"
depends = ["common_msgs", "robot_model"]
"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        let package = manifest.package.as_ref().unwrap();
        assert_eq!(package.name, "nav_core");
        assert_eq!(package.depends, vec!["common_msgs", "robot_model"]);
        assert!(!manifest.is_workspace_root());
    }

    #[test]
    fn test_load_workspace_manifest() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(
            &path,
            r#"
[workspace]
build_dir = "out"
jobs = 4
build_type = "Release"
"#,
        )
        .unwrap();

        let manifest = Manifest::load(&path).unwrap();
        assert!(manifest.is_workspace_root());

        let config = manifest.workspace.unwrap();
        assert_eq!(config.build_dir, "out");
        assert_eq!(config.log_dir, "log");
        assert_eq!(config.jobs, Some(4));
        assert_eq!(config.build_type, Some(BuildType::Release));
    }

    #[test]
    fn test_workspace_config_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "[workspace]\n").unwrap();

        let config = Manifest::load(&path).unwrap().workspace.unwrap();
        assert_eq!(config.build_dir, "build");
        assert_eq!(config.log_dir, "log");
        assert_eq!(config.jobs, None);
        assert_eq!(config.build_type, None);
    }

    #[test]
    fn test_empty_manifest_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "# nothing here\n").unwrap();

        let err = Manifest::load(&path).unwrap_err().to_string();
        assert!(err.contains("invalid manifest"));
    }

    #[test]
    fn test_empty_package_name_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "[package]\nname = \"\"\n").unwrap();

        assert!(Manifest::load(&path).is_err());
    }
}
