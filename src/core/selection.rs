//! Selection - resolving user input to a concrete set of packages.
//!
//! A selection is computed fresh per invocation from CLI arguments and,
//! in `--this` mode, the current working directory. Explicit names and
//! directory mode are mutually exclusive at the CLI layer; this module
//! only knows the three resolution strategies.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::core::workspace::Workspace;

/// Error resolving an explicit package selection.
#[derive(Debug, Error)]
pub enum SelectionError {
    #[error("package `{name}` not found in workspace\navailable packages: {available}")]
    UnknownPackage { name: String, available: String },
}

/// The resolved set of target package names for one command.
#[derive(Debug, Clone)]
pub struct Selection {
    names: BTreeSet<String>,

    /// Whether transitive dependencies are included when expanding.
    pub include_deps: bool,
}

impl Selection {
    /// Resolve explicit package names against the workspace.
    ///
    /// Fails on the first name that is not a workspace package.
    pub fn explicit(ws: &Workspace, names: &[String]) -> Result<Self, SelectionError> {
        let mut resolved = BTreeSet::new();
        for name in names {
            if !ws.contains(name) {
                let available = ws.package_names();
                return Err(SelectionError::UnknownPackage {
                    name: name.clone(),
                    available: if available.is_empty() {
                        "(none)".to_string()
                    } else {
                        available.join(", ")
                    },
                });
            }
            resolved.insert(name.clone());
        }
        Ok(Selection {
            names: resolved,
            include_deps: true,
        })
    }

    /// Resolve the packages at or under `dir`.
    ///
    /// If no package root lies under `dir`, falls back to the single
    /// package (if any) whose root is an ancestor of `dir`. An empty
    /// result is not an error; callers decide whether it is fatal.
    pub fn from_directory(ws: &Workspace, dir: &Path) -> Self {
        let mut names: BTreeSet<String> = ws
            .packages()
            .filter(|p| p.root().starts_with(dir))
            .map(|p| p.name().to_string())
            .collect();

        if names.is_empty() {
            if let Some(containing) = ws.packages().find(|p| dir.starts_with(p.root())) {
                names.insert(containing.name().to_string());
            }
        }

        Selection {
            names,
            include_deps: true,
        }
    }

    /// Select every package in the workspace.
    pub fn all(ws: &Workspace) -> Self {
        Selection {
            names: ws
                .packages()
                .map(|p| p.name().to_string())
                .collect(),
            include_deps: true,
        }
    }

    /// Set whether transitive dependencies are included.
    pub fn with_include_deps(mut self, include_deps: bool) -> Self {
        self.include_deps = include_deps;
        self
    }

    /// Get the selected names in name order.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    /// Iterate over the selected names.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Get the number of selected packages.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
