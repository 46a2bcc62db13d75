//! Core data structures for Slipway.
//!
//! This module contains the foundational types used throughout Slipway:
//! - Manifests (`Slipway.toml` for workspaces and packages)
//! - Packages and the workspace snapshot
//! - Selection of target packages for a command

pub mod manifest;
pub mod package;
pub mod selection;
pub mod workspace;

pub use manifest::{Manifest, PackageMetadata, WorkspaceConfig, MANIFEST_NAME};
pub use package::Package;
pub use selection::{Selection, SelectionError};
pub use workspace::{Workspace, WorkspaceError};
