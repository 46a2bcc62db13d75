//! `slipway build` command

use anyhow::{bail, Context, Result};

use crate::cli::BuildArgs;
use slipway::backend::{BuildBackend, CmakeBackend};
use slipway::core::selection::Selection;
use slipway::core::workspace::Workspace;
use slipway::graph::DepGraph;
use slipway::ops::build::{run_build, BuildOptions, CancelToken};
use slipway::ops::clean::{clean_packages, CleanOptions};

pub fn execute(args: BuildArgs, verbose: bool) -> Result<i32> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    let ws = Workspace::locate(&cwd)?;

    if !args.packages.is_empty() && args.this {
        bail!("specify either package names or --this, not both");
    }

    let selection = if args.this {
        let selection = Selection::from_directory(&ws, &cwd);
        if selection.is_empty() {
            bail!(
                "no package found in the current directory or containing the current directory"
            );
        }
        selection
    } else if !args.packages.is_empty() {
        Selection::explicit(&ws, &args.packages)?
    } else {
        Selection::all(&ws)
    }
    .with_include_deps(!args.no_deps);

    // Pre-build clean over the same selection, gated by --yes.
    if args.clean {
        let clean_opts = CleanOptions {
            force: args.yes,
            logs_only: false,
        };
        let report = clean_packages(&ws, &selection, &clean_opts)?;
        if !report.success() {
            eprintln!("{}", report.summary());
            return Ok(report.exit_code());
        }
    }

    let graph = DepGraph::build(&ws);
    let expanded = graph.expand(selection.iter(), selection.include_deps);
    let order = graph.topo_order(&expanded)?;

    if order.is_empty() {
        tracing::info!("nothing to build");
        return Ok(0);
    }

    let backend = CmakeBackend::new()?;
    tracing::debug!("using {} backend", backend.name());

    // CLI flags win over workspace configuration.
    let config = ws.config();
    let opts = BuildOptions {
        build_type: args.build_type.or(config.build_type),
        build_tests: args.build_tests,
        continue_on_error: args.continue_on_error,
        clear_cache: args.cmake_clean_cache,
        verbose,
        jobs: args.jobs.or(config.jobs),
    };

    let cancel = CancelToken::new();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())
            .context("failed to install interrupt handler")?;
    }

    let report = run_build(&ws, &graph, &backend, &order, &opts, &cancel)?;

    eprintln!("{}", report.summary());
    if cancel.is_cancelled() {
        eprintln!("error: build interrupted");
        return Ok(1);
    }

    Ok(report.exit_code())
}
