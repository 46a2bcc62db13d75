//! Aggregated outcomes and exit codes.
//!
//! Reports map per-package results to a process exit status and a
//! human-readable summary. Build summaries preserve topological order
//! so failures read in the same order the scheduler worked.

use std::fmt::Write as _;
use std::path::PathBuf;

/// Why a package was skipped instead of built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// A dependency in the current run failed or was itself skipped.
    DependencyFailed,

    /// The scheduler stopped after an earlier failure
    /// (continue-on-error disabled).
    EarlyStop,

    /// The run was interrupted before this package started.
    Interrupted,
}

impl SkipReason {
    fn as_str(&self) -> &'static str {
        match self {
            SkipReason::DependencyFailed => "dependency failed",
            SkipReason::EarlyStop => "stopped after earlier failure",
            SkipReason::Interrupted => "interrupted",
        }
    }
}

/// Terminal outcome of one package in a build run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Succeeded,
    Failed { error: String },
    Skipped { reason: SkipReason },
}

impl BuildOutcome {
    /// Check whether this outcome counts as success.
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded)
    }
}

/// Per-package outcomes of one build run, in topological order.
#[derive(Debug)]
pub struct BuildReport {
    entries: Vec<(String, BuildOutcome)>,
}

impl BuildReport {
    /// Create a report from outcomes in topological order.
    pub fn new(entries: Vec<(String, BuildOutcome)>) -> Self {
        BuildReport { entries }
    }

    /// Get the outcome for a package.
    pub fn outcome(&self, name: &str) -> Option<&BuildOutcome> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, o)| o)
    }

    /// Iterate over outcomes in topological order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BuildOutcome)> {
        self.entries.iter().map(|(n, o)| (n.as_str(), o))
    }

    /// Check whether every package succeeded.
    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|(_, o)| o.is_success())
    }

    /// Map the outcomes to a process exit code.
    pub fn exit_code(&self) -> i32 {
        if self.all_succeeded() {
            0
        } else {
            1
        }
    }

    /// Produce the human-readable summary.
    pub fn summary(&self) -> String {
        let succeeded = self
            .entries
            .iter()
            .filter(|(_, o)| o.is_success())
            .count();
        let failed: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(n, o)| match o {
                BuildOutcome::Failed { error } => Some((n, error)),
                _ => None,
            })
            .collect();
        let skipped: Vec<_> = self
            .entries
            .iter()
            .filter_map(|(n, o)| match o {
                BuildOutcome::Skipped { reason } => Some((n, *reason)),
                _ => None,
            })
            .collect();

        let mut out = format!(
            "{} succeeded, {} failed, {} skipped",
            succeeded,
            failed.len(),
            skipped.len()
        );

        for (name, error) in &failed {
            let _ = write!(out, "\n  failed: {}", name);
            for line in error.lines() {
                let _ = write!(out, "\n    {}", line);
            }
        }
        for (name, reason) in &skipped {
            let _ = write!(out, "\n  skipped: {} ({})", name, reason.as_str());
        }

        out
    }
}

/// The result of one clean run.
#[derive(Debug, Default)]
pub struct CleanReport {
    /// Directories that were removed.
    pub removed: Vec<PathBuf>,

    /// Per-package failures: (package name, error).
    pub failures: Vec<(String, String)>,
}

impl CleanReport {
    /// Record a removed directory.
    pub fn record_removed(&mut self, path: PathBuf) {
        self.removed.push(path);
    }

    /// Record a failed deletion.
    pub fn record_failure(&mut self, package: &str, error: String) {
        self.failures.push((package.to_string(), error));
    }

    /// Check whether every deletion succeeded.
    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Map the result to a process exit code.
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    /// Produce the human-readable summary.
    pub fn summary(&self) -> String {
        let mut out = format!("removed {} path(s)", self.removed.len());
        for (package, error) in &self.failures {
            let _ = write!(out, "\n  failed: {}: {}", package, error);
        }
        out
    }
}
