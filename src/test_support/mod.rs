//! Test fixtures and mocks for Slipway unit tests.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Result;

use crate::backend::{BackendOutcome, BuildBackend, BuildRequest};
use crate::core::manifest::MANIFEST_NAME;
use crate::core::workspace::Workspace;

/// Write a workspace on disk and scan it.
///
/// Each entry is `(package name, declared dependencies)`; packages are
/// created under `src/<name>`.
pub fn fixture_workspace(root: &Path, packages: &[(&str, &[&str])]) -> Workspace {
    std::fs::write(root.join(MANIFEST_NAME), "[workspace]\n").unwrap();

    for (name, depends) in packages {
        let dir = root.join("src").join(name);
        std::fs::create_dir_all(&dir).unwrap();
        let deps = depends
            .iter()
            .map(|d| format!("\"{}\"", d))
            .collect::<Vec<_>>()
            .join(", ");
        std::fs::write(
            dir.join(MANIFEST_NAME),
            format!("[package]\nname = \"{}\"\ndepends = [{}]\n", name, deps),
        )
        .unwrap();
    }

    Workspace::scan(root).unwrap()
}

/// A scripted build backend that records invocations.
pub struct MockBackend {
    invocations: Mutex<Vec<String>>,
    failing: HashSet<String>,
}

impl MockBackend {
    /// Create a backend where every build succeeds.
    pub fn new() -> Self {
        MockBackend {
            invocations: Mutex::new(Vec::new()),
            failing: HashSet::new(),
        }
    }

    /// Script the given packages to fail.
    pub fn failing(mut self, names: &[&str]) -> Self {
        self.failing = names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Get the invoked package names, in invocation order.
    pub fn invoked(&self) -> Vec<String> {
        self.invocations.lock().unwrap().clone()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    fn build(&self, req: &BuildRequest<'_>) -> Result<BackendOutcome> {
        let name = req.package.name().to_string();
        self.invocations.lock().unwrap().push(name.clone());

        if self.failing.contains(&name) {
            Ok(BackendOutcome {
                success: false,
                log: format!("scripted failure for {}", name),
            })
        } else {
            Ok(BackendOutcome {
                success: true,
                log: format!("built {}", name),
            })
        }
    }
}
