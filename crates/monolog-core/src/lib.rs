//! Monolog Core - Core library for per-package versioning in multi-package repositories
//!
//! This crate provides the foundational types, error handling, configuration,
//! and the manifest dependency graph used by the rest of monolog.

pub mod config;
pub mod error;
pub mod monorepo;
pub mod types;

pub use error::{MonologError, Result};
pub use monorepo::{DependencyGraph, GraphBuild, ManifestGraphBuilder, ManifestNode};
pub use types::BumpSeverity;
