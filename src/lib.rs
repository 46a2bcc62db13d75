//! Slipway - a workspace-level build orchestrator for CMake package trees
//!
//! This crate provides the core library functionality for Slipway,
//! including package discovery, dependency resolution, build scheduling,
//! and artifact cleaning.

pub mod backend;
pub mod core;
pub mod graph;
pub mod ops;
pub mod util;

/// Test utilities and mocks for Slipway unit tests.
///
/// This module is only available when compiling with `--cfg test` or
/// running tests. It provides a scripted build backend and on-disk
/// workspace fixtures.
#[cfg(test)]
pub mod test_support;

pub use crate::backend::{BackendOutcome, BuildBackend, BuildRequest, BuildType, CmakeBackend};
pub use crate::core::{
    manifest::Manifest, package::Package, selection::Selection, workspace::Workspace,
};
pub use crate::graph::DepGraph;
