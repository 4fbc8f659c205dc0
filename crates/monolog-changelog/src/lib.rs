//! Monolog Changelog - Commit parsing, change attribution and changelog generation
//!
//! This crate turns commit history into per-package version bumps and
//! grouped changelogs.

pub mod attribution;
pub mod bump;
pub mod formatter;
pub mod generator;
pub mod parser;
pub mod pipeline;
pub mod types;

pub use attribution::{Attribution, ChangeAttributor};
pub use generator::ChangelogGenerator;
pub use parser::{CommitParser, GrammarParser, GrammarSet};
pub use pipeline::{PackageReport, ReleasePlan, ReleasePlanner, Workspace};
pub use types::{AttributedChange, ChangeDescriptor, TagPosition, TypeSection, VersionGroup};
