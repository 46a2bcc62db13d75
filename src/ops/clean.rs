//! Clean engine.
//!
//! Removes derived artifacts for a selected package set. Deletion is
//! best-effort per package: one failure is recorded and the remaining
//! packages are still attempted. Nothing is deleted before the
//! confirmation policy is satisfied.

use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::core::package::Package;
use crate::core::selection::Selection;
use crate::core::workspace::Workspace;
use crate::ops::report::CleanReport;
use crate::util::fs::{relative_path, remove_dir_all_if_exists};

/// Options for one clean run.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// Skip the confirmation prompt. Default: false.
    pub force: bool,

    /// Remove only the log directories, never the build artifacts.
    /// Default: false.
    pub logs_only: bool,
}

/// Clean artifacts for the selected packages.
///
/// An empty selection means every package in the workspace, and always
/// requires confirmation unless `force` is set.
pub fn clean_packages(
    ws: &Workspace,
    selection: &Selection,
    opts: &CleanOptions,
) -> Result<CleanReport> {
    let whole_workspace = selection.is_empty();
    let targets: Vec<&Package> = if whole_workspace {
        ws.packages().collect()
    } else {
        selection.iter().filter_map(|name| ws.get(name)).collect()
    };

    if targets.is_empty() {
        tracing::debug!("nothing to clean");
        return Ok(CleanReport::default());
    }

    if !opts.force {
        let what = if opts.logs_only {
            "build logs"
        } else {
            "build artifacts and logs"
        };
        let scope = if whole_workspace {
            format!("all {} workspace packages", targets.len())
        } else {
            format!("{} package(s)", targets.len())
        };
        if !confirm(&format!("This will remove {} for {}. Continue?", what, scope))? {
            bail!("clean aborted");
        }
    }

    let mut report = CleanReport::default();
    for package in targets {
        let mut dirs: Vec<&Path> = Vec::new();
        if !opts.logs_only {
            dirs.push(package.build_dir());
        }
        dirs.push(package.log_dir());

        for dir in dirs {
            match remove_dir_all_if_exists(dir) {
                Ok(true) => {
                    tracing::info!("removed {}", relative_path(ws.root(), dir).display());
                    report.record_removed(dir.to_path_buf());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::error!("cleaning {} failed: {:#}", package.name(), e);
                    report.record_failure(package.name(), format!("{:#}", e));
                }
            }
        }
    }

    Ok(report)
}

/// Ask the user for a yes/no confirmation on the terminal.
fn confirm(prompt: &str) -> Result<bool> {
    if !io::stdin().is_terminal() {
        bail!(
            "cannot prompt for confirmation in non-interactive mode.\n\
             Use --force to skip the prompt."
        );
    }

    eprint!("{} [y/N] ", prompt);
    io::stderr().flush().context("failed to flush stderr")?;

    let mut input = String::new();
    io::stdin()
        .read_line(&mut input)
        .context("failed to read confirmation")?;

    Ok(matches!(
        input.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}
