//! Changelog formatters

mod json;
mod markdown;
mod registry;

pub use json::JsonFormatter;
pub use markdown::MarkdownFormatter;
pub use registry::FormatterRegistry;

use monolog_core::config::ChangelogConfig;

use crate::types::VersionGroup;

/// Trait for changelog formatters
pub trait ChangelogFormatter: Send + Sync {
    /// Format version groups, newest first, to a string
    fn format(&self, groups: &[VersionGroup], config: &ChangelogConfig) -> String;

    /// Format name as used in configuration
    fn name(&self) -> &'static str;

    /// Get the file extension for this format
    fn extension(&self) -> &'static str;
}
