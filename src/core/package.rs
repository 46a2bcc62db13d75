//! Package - a buildable unit discovered in the workspace.
//!
//! A Package combines its manifest metadata with the resolved on-disk
//! locations for sources, build artifacts, and logs. Packages are
//! created at workspace-scan time and immutable afterwards.

use std::path::{Path, PathBuf};

use crate::core::manifest::PackageMetadata;

/// A package with its metadata and derived artifact locations.
#[derive(Debug, Clone)]
pub struct Package {
    /// Parsed `[package]` metadata.
    metadata: PackageMetadata,

    /// Root directory of the package sources.
    root: PathBuf,

    /// Directory holding this package's build artifacts.
    build_dir: PathBuf,

    /// Directory holding this package's build logs.
    log_dir: PathBuf,
}

impl Package {
    /// Create a new package from metadata and resolved locations.
    pub fn new(
        metadata: PackageMetadata,
        root: PathBuf,
        build_dir: PathBuf,
        log_dir: PathBuf,
    ) -> Self {
        Package {
            metadata,
            root,
            build_dir,
            log_dir,
        }
    }

    /// Get the package name.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Get the declared dependency names, in declared order.
    pub fn depends(&self) -> &[String] {
        &self.metadata.depends
    }

    /// Get the package root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get the build artifact directory for this package.
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Get the log directory for this package.
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Get the optional description.
    pub fn description(&self) -> Option<&str> {
        self.metadata.description.as_deref()
    }
}

impl std::fmt::Display for Package {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for Package {}

impl std::hash::Hash for Package {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.name().hash(state);
    }
}
