//! CLI definitions using clap.

use clap::{Args, Parser, Subcommand};

use slipway::backend::BuildType;

/// Slipway - a workspace-level build orchestrator for CMake package trees
#[derive(Parser)]
#[command(name = "slipway")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Print verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build workspace packages in dependency order
    Build(BuildArgs),

    /// Remove build artifacts and logs
    Clean(CleanArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// If specified, only these packages are built
    pub packages: Vec<String>,

    /// Build the package(s) in the current directory
    #[arg(long)]
    pub this: bool,

    /// Enable building tests
    #[arg(long)]
    pub build_tests: bool,

    /// The CMake build type
    #[arg(long, value_enum)]
    pub build_type: Option<BuildType>,

    /// Build only the specified packages, not their dependencies
    #[arg(long)]
    pub no_deps: bool,

    /// Continue building other packages if a package build fails
    #[arg(long)]
    pub continue_on_error: bool,

    /// Clean before building
    #[arg(long)]
    pub clean: bool,

    /// Clean the CMake cache before building
    #[arg(long)]
    pub cmake_clean_cache: bool,

    /// Number of packages built in parallel
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Automatically answer yes to all questions
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct CleanArgs {
    /// If specified, only these packages are cleaned
    pub packages: Vec<String>,

    /// Do not ask for confirmation
    #[arg(long)]
    pub force: bool,

    /// If specified, only the logs are cleaned
    #[arg(long)]
    pub logs: bool,
}
