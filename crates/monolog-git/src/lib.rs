//! Monolog Git - Git history reading for per-package versioning
//!
//! This crate provides repository discovery, ordered commit history with
//! the files each commit touched, and version tag resolution.

mod commits;
mod repository;
pub mod tags;
pub mod types;

pub use commits::split_refs;
pub use repository::{find_repo_root, GitRepo, Result};
pub use tags::{ProjectQuery, TagTemplate};
pub use types::{CommitRecord, VersionTag};
