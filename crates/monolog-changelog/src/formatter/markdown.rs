//! Markdown changelog formatter

use monolog_core::config::ChangelogConfig;
use tracing::{debug, instrument};

use super::ChangelogFormatter;
use crate::types::{AttributedChange, VersionGroup};

/// Markdown changelog formatter
#[derive(Debug, Default)]
pub struct MarkdownFormatter;

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self
    }

    fn heading(&self, group: &VersionGroup, config: &ChangelogConfig) -> String {
        if group.is_unreleased() {
            return format!("## {}\n\n", group.version);
        }
        match group.date.filter(|_| config.include_dates) {
            Some(date) => format!("## [{}] - {}\n\n", group.version, date.format("%Y-%m-%d")),
            None => format!("## [{}]\n\n", group.version),
        }
    }

    fn item(&self, change: &AttributedChange, config: &ChangelogConfig) -> String {
        let descriptor = &change.descriptor;
        let mut line = format!("- {}", descriptor.title);

        if let Some(scope) = &descriptor.scope {
            line.push_str(&format!(" ({})", scope));
        }

        if config.include_hashes {
            line.push_str(&format!(" ({})", change.commit.short_hash));
        }

        if config.include_authors {
            line.push_str(&format!(" - {}", change.commit.author));
        }

        line.push('\n');
        line
    }
}

impl ChangelogFormatter for MarkdownFormatter {
    #[instrument(skip_all, fields(groups = groups.len()))]
    fn format(&self, groups: &[VersionGroup], config: &ChangelogConfig) -> String {
        let mut output = String::new();

        for group in groups {
            output.push_str(&self.heading(group, config));

            if !group.breaking_changes.is_empty() {
                output.push_str("### ⚠ BREAKING CHANGES\n\n");
                for change in &group.breaking_changes {
                    output.push_str(&self.item(change, config));
                }
                output.push('\n');
            }

            for section in &group.sections {
                if section.is_empty() {
                    continue;
                }

                output.push_str(&format!("### {}\n\n", config.section_title(&section.label)));
                for change in &section.changes {
                    output.push_str(&self.item(change, config));
                }
                output.push('\n');
            }
        }

        debug!(output_len = output.len(), "markdown changelog formatted");
        output
    }

    fn name(&self) -> &'static str {
        "markdown"
    }

    fn extension(&self) -> &'static str {
        "md"
    }
}
