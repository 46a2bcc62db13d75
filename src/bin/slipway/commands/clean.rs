//! `slipway clean` command

use anyhow::{Context, Result};

use crate::cli::CleanArgs;
use slipway::core::selection::Selection;
use slipway::core::workspace::Workspace;
use slipway::ops::clean::{clean_packages, CleanOptions};

pub fn execute(args: CleanArgs) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let ws = Workspace::locate(&cwd)?;

    // An empty selection means the whole workspace; the clean engine
    // applies the confirmation policy for that case.
    let selection = Selection::explicit(&ws, &args.packages)?;

    let opts = CleanOptions {
        force: args.force,
        logs_only: args.logs,
    };

    let report = clean_packages(&ws, &selection, &opts)?;
    eprintln!("{}", report.summary());
    Ok(report.exit_code())
}
