//! Build backend collaborator interface.
//!
//! The orchestration core never compiles anything itself; it hands each
//! package to a [`BuildBackend`] and records the outcome. A failed
//! invocation is data (an unsuccessful [`BackendOutcome`]), not a
//! process abort.

pub mod cmake;

use std::fmt;

use anyhow::Result;
use clap::ValueEnum;
use serde::Deserialize;

use crate::core::package::Package;

pub use cmake::CmakeBackend;

/// The CMake build type for a package build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ValueEnum)]
#[value(rename_all = "verbatim")]
pub enum BuildType {
    Debug,
    RelWithDebInfo,
    Release,
}

impl BuildType {
    /// Get the value passed to `-DCMAKE_BUILD_TYPE`.
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Debug => "Debug",
            BuildType::RelWithDebInfo => "RelWithDebInfo",
            BuildType::Release => "Release",
        }
    }
}

impl fmt::Display for BuildType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BuildType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Debug" => Ok(BuildType::Debug),
            "RelWithDebInfo" => Ok(BuildType::RelWithDebInfo),
            "Release" => Ok(BuildType::Release),
            _ => Err(format!(
                "invalid build type '{}'; expected 'Debug', 'RelWithDebInfo', or 'Release'",
                s
            )),
        }
    }
}

/// One build request, covering a single package.
#[derive(Debug)]
pub struct BuildRequest<'a> {
    /// The package to build.
    pub package: &'a Package,

    /// CMake build type, if one was selected.
    pub build_type: Option<BuildType>,

    /// Enable building tests.
    pub build_tests: bool,

    /// Verbose backend output.
    pub verbose: bool,

    /// Reset the backend's configuration cache before building.
    pub clear_cache: bool,
}

/// The result of one backend invocation.
#[derive(Debug)]
pub struct BackendOutcome {
    /// Whether the invocation succeeded.
    pub success: bool,

    /// Combined log output of the invocation.
    pub log: String,
}

/// An external tool that builds one package at a time.
///
/// Implementations must be shareable across scheduler workers.
pub trait BuildBackend: Send + Sync {
    /// Backend name for log messages.
    fn name(&self) -> &str;

    /// Build one package.
    ///
    /// An `Err` means the backend could not be invoked at all; a
    /// completed-but-failed build is `Ok` with `success == false`.
    fn build(&self, req: &BuildRequest<'_>) -> Result<BackendOutcome>;
}
