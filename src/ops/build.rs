//! Build scheduler.
//!
//! Packages are dispatched to the build backend in dependency order via
//! a ready queue: each package carries a countdown of unfinished
//! in-workspace dependencies, and becomes eligible when it reaches zero.
//! Eligible packages run concurrently on a rayon pool bounded by the
//! configured worker limit. Outcome reporting order is always the
//! deterministic topological order handed in, regardless of how the
//! workers interleave.
//!
//! Cancellation is cooperative: once the [`CancelToken`] trips, no new
//! backend invocation starts; invocations already running are awaited
//! to completion, never killed, and the aggregated report still covers
//! every package in the run.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::Scope;

use crate::backend::{BuildBackend, BuildRequest, BuildType};
use crate::core::workspace::Workspace;
use crate::graph::DepGraph;
use crate::ops::report::{BuildOutcome, BuildReport, SkipReason};

/// How many trailing log lines are kept as the failure detail.
const ERROR_TAIL_LINES: usize = 40;

/// Options for one build run. Passed by value into the scheduler.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// CMake build type. Default: none (backend default).
    pub build_type: Option<BuildType>,

    /// Enable building tests. Default: false.
    pub build_tests: bool,

    /// Keep dispatching independent packages after a failure.
    /// Default: false (stop after the first failure).
    pub continue_on_error: bool,

    /// Reset each package's backend cache immediately before its own
    /// build. Default: false.
    pub clear_cache: bool,

    /// Verbose backend output. Default: false.
    pub verbose: bool,

    /// Worker limit for parallel dispatch. Default: one worker per core.
    pub jobs: Option<usize>,
}

/// Shared flag used to stop dispatch of not-yet-started packages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a fresh, untripped token.
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    /// Trip the token.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check whether the token has been tripped.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

struct State {
    outcomes: HashMap<String, BuildOutcome>,
    pending: HashMap<String, usize>,
    halted: bool,
}

struct TaskCx<'a> {
    ws: &'a Workspace,
    backend: &'a dyn BuildBackend,
    opts: &'a BuildOptions,
    cancel: &'a CancelToken,
    /// In-run dependencies per package.
    deps: HashMap<String, Vec<String>>,
    /// In-run dependents per package.
    dependents: HashMap<String, Vec<String>>,
    state: Mutex<State>,
    progress: ProgressBar,
}

fn lock<'m, T>(mutex: &'m Mutex<T>) -> MutexGuard<'m, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Run the build over `order` (a topological order of package names).
///
/// Returns one terminal [`BuildOutcome`] per package, in `order`.
pub fn run_build(
    ws: &Workspace,
    graph: &DepGraph,
    backend: &dyn BuildBackend,
    order: &[String],
    opts: &BuildOptions,
    cancel: &CancelToken,
) -> Result<BuildReport> {
    let in_run: HashSet<&str> = order.iter().map(String::as_str).collect();

    let mut deps: HashMap<String, Vec<String>> = HashMap::new();
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    let mut pending: HashMap<String, usize> = HashMap::new();
    for name in order {
        let within: Vec<String> = graph
            .deps(name)
            .into_iter()
            .filter(|d| in_run.contains(d.as_str()))
            .collect();
        pending.insert(name.clone(), within.len());
        for dep in &within {
            dependents.entry(dep.clone()).or_default().push(name.clone());
        }
        deps.insert(name.clone(), within);
    }

    let initial: Vec<String> = order
        .iter()
        .filter(|name| pending.get(name.as_str()) == Some(&0))
        .cloned()
        .collect();

    let progress = if opts.verbose || order.len() <= 1 {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new(order.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("#>-"),
        );
        pb
    };

    let cx = TaskCx {
        ws,
        backend,
        opts,
        cancel,
        deps,
        dependents,
        state: Mutex::new(State {
            outcomes: HashMap::new(),
            pending,
            halted: false,
        }),
        progress,
    };

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(opts.jobs.unwrap_or(0))
        .build()
        .context("failed to create build worker pool")?;

    let cx_ref = &cx;
    pool.scope(move |scope| {
        for name in initial {
            scope.spawn(move |scope| build_one(scope, cx_ref, name));
        }
    });

    cx.progress.finish_and_clear();

    // Everything the workers never recorded is swept here, in topological
    // order so a dependency's final outcome is known before its
    // dependents are classified.
    let TaskCx { deps, state, .. } = cx;
    let mut outcomes = state
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .outcomes;

    let cancelled = cancel.is_cancelled();
    let mut final_map: HashMap<String, BuildOutcome> = HashMap::with_capacity(order.len());
    let mut entries = Vec::with_capacity(order.len());
    for name in order {
        let outcome = match outcomes.remove(name) {
            Some(outcome) => outcome,
            None => {
                let dep_bad = deps[name.as_str()]
                    .iter()
                    .any(|d| !final_map.get(d).map_or(false, BuildOutcome::is_success));
                let reason = if dep_bad {
                    SkipReason::DependencyFailed
                } else if cancelled {
                    SkipReason::Interrupted
                } else {
                    SkipReason::EarlyStop
                };
                BuildOutcome::Skipped { reason }
            }
        };
        final_map.insert(name.clone(), outcome.clone());
        entries.push((name.clone(), outcome));
    }

    Ok(BuildReport::new(entries))
}

fn build_one<'a, 'scope>(scope: &Scope<'scope>, cx: &'scope TaskCx<'a>, name: String)
where
    'a: 'scope,
{
    enum Decision {
        Run,
        Skip(SkipReason),
        Defer,
    }

    let decision = {
        let st = lock(&cx.state);
        let dep_bad = cx.deps[&name]
            .iter()
            .any(|d| !st.outcomes.get(d).map_or(false, BuildOutcome::is_success));
        if dep_bad {
            Decision::Skip(SkipReason::DependencyFailed)
        } else if st.halted || cx.cancel.is_cancelled() {
            // Left for the post-run sweep.
            Decision::Defer
        } else {
            Decision::Run
        }
    };

    match decision {
        Decision::Defer => {}
        Decision::Skip(reason) => {
            tracing::debug!("skipping {}: dependency failed", name);
            finish(scope, cx, name, BuildOutcome::Skipped { reason });
        }
        Decision::Run => {
            let package = cx
                .ws
                .get(&name)
                .expect("scheduled package exists in workspace");
            tracing::info!("building {}", name);
            cx.progress.set_message(name.clone());

            let request = BuildRequest {
                package,
                build_type: cx.opts.build_type,
                build_tests: cx.opts.build_tests,
                verbose: cx.opts.verbose,
                clear_cache: cx.opts.clear_cache,
            };

            let outcome = match cx.backend.build(&request) {
                Ok(result) if result.success => BuildOutcome::Succeeded,
                Ok(result) => BuildOutcome::Failed {
                    error: log_tail(&result.log, ERROR_TAIL_LINES),
                },
                Err(e) => BuildOutcome::Failed {
                    error: format!("{:#}", e),
                },
            };

            if let BuildOutcome::Failed { .. } = outcome {
                tracing::error!("build of {} failed", name);
            }

            finish(scope, cx, name, outcome);
        }
    }
}

fn finish<'a, 'scope>(scope: &Scope<'scope>, cx: &'scope TaskCx<'a>, name: String, outcome: BuildOutcome)
where
    'a: 'scope,
{
    cx.progress.inc(1);

    let ready = {
        let mut st = lock(&cx.state);
        if matches!(outcome, BuildOutcome::Failed { .. }) && !cx.opts.continue_on_error {
            st.halted = true;
        }
        st.outcomes.insert(name.clone(), outcome);

        let mut ready = Vec::new();
        if !st.halted && !cx.cancel.is_cancelled() {
            if let Some(dependents) = cx.dependents.get(&name) {
                for dependent in dependents {
                    if let Some(count) = st.pending.get_mut(dependent) {
                        *count -= 1;
                        if *count == 0 {
                            ready.push(dependent.clone());
                        }
                    }
                }
            }
        }
        ready
    };

    for next in ready {
        scope.spawn(move |scope| build_one(scope, cx, next));
    }
}

/// Keep at most the last `max_lines` lines of a backend log.
fn log_tail(log: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = log.lines().collect();
    if lines.len() <= max_lines {
        log.trim_end().to_string()
    } else {
        lines[lines.len() - max_lines..].join("\n")
    }
}
