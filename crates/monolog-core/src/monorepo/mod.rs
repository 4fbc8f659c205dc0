//! Multi-package repository support
//!
//! This module provides:
//! - Manifest discovery with excluded directories
//! - Manifest parsing with dependency kinds and specifier protocols
//! - A possibly cyclic dependency graph with dependant/dependency queries

pub mod discovery;
pub mod graph;
pub mod manifest;

pub use discovery::{find_manifests, ManifestWarning};
pub use graph::{DependencyGraph, EdgeFilter, GraphBuild, ManifestGraphBuilder};
pub use manifest::{DependencyKind, DependencyProtocol, DependencySpec, ManifestNode};
