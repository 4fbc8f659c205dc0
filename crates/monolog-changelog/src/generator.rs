//! Changelog generation
//!
//! Changes are partitioned into version windows by the tags of their
//! package: everything up to and including the first tagged commit belongs
//! to that tag, everything after tag N up to and including tag N+1 belongs
//! to N+1, and everything after the last tag is unreleased.

use std::cmp::Reverse;
use std::sync::Arc;

use monolog_core::config::{ChangelogConfig, SectionOrder};
use monolog_core::BumpSeverity;
use tracing::{debug, info, instrument};

use crate::bump;
use crate::formatter::{ChangelogFormatter, MarkdownFormatter};
use crate::types::{AttributedChange, TagPosition, TypeSection, VersionGroup, UNRELEASED};

/// Changelog generator
pub struct ChangelogGenerator {
    formatter: Arc<dyn ChangelogFormatter>,
    config: ChangelogConfig,
    order: SectionOrder,
}

impl ChangelogGenerator {
    /// Create a new generator with the markdown formatter
    pub fn new(config: ChangelogConfig) -> Self {
        Self {
            formatter: Arc::new(MarkdownFormatter::new()),
            order: config.section_order,
            config,
        }
    }

    /// Use a shared formatter, e.g. one picked from the registry
    pub fn with_shared_formatter(mut self, formatter: Arc<dyn ChangelogFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Override the configured section order
    pub fn with_order(mut self, order: SectionOrder) -> Self {
        self.order = order;
        self
    }

    /// Group `changes` into versions, newest first.
    ///
    /// `changes` must be in commit order; `tags` are the package's tags in
    /// any order. When one commit carries several tags only the highest
    /// version opens a window. Versions without visible changes are left out.
    #[instrument(skip_all, fields(changes = changes.len(), tags = tags.len()))]
    pub fn generate(
        &self,
        changes: &[AttributedChange],
        tags: &[TagPosition],
    ) -> Vec<VersionGroup> {
        let mut tags: Vec<&TagPosition> = tags.iter().collect();
        tags.sort_by(|a, b| b.recency(a));
        tags.dedup_by_key(|t| t.sequence);
        tags.reverse();

        let mut windows: Vec<Vec<&AttributedChange>> = vec![Vec::new(); tags.len() + 1];
        for change in changes {
            let window = tags.partition_point(|t| t.sequence < change.sequence);
            windows[window].push(change);
        }

        let mut groups = Vec::new();
        for (index, window) in windows.into_iter().enumerate().rev() {
            let mut group = match tags.get(index) {
                Some(tag) => VersionGroup::new(tag.tag.version.clone(), Some(tag.date)),
                None => VersionGroup::new(UNRELEASED, None),
            };
            self.fill_group(&mut group, &window);

            if group.is_empty() {
                continue;
            }
            groups.push(group);
        }

        info!(groups = groups.len(), "changelog groups built");
        groups
    }

    fn fill_group(&self, group: &mut VersionGroup, changes: &[&AttributedChange]) {
        for change in changes {
            if change.descriptor.breaking {
                group.breaking_changes.push((*change).clone());
            }

            let label = &change.descriptor.change_type;
            if self.config.is_hidden(label) {
                continue;
            }

            match group.sections.iter_mut().find(|s| &s.label == label) {
                Some(section) => section.changes.push((*change).clone()),
                None => {
                    let mut section = TypeSection::new(label.clone());
                    section.changes.push((*change).clone());
                    group.sections.push(section);
                }
            }
        }

        self.sort_sections(&mut group.sections);
        debug!(
            version = %group.version,
            sections = group.sections.len(),
            breaking = group.breaking_changes.len(),
            "version group built"
        );
    }

    /// Order sections by the selected mode; ties keep first-appearance order
    fn sort_sections(&self, sections: &mut [TypeSection]) {
        match self.order {
            SectionOrder::Configured => {
                let position = |label: &str| {
                    self.config
                        .order
                        .iter()
                        .position(|l| l == label)
                        .unwrap_or(self.config.order.len())
                };
                sections.sort_by_key(|s| position(&s.label));
            }
            SectionOrder::Alphabetical => {
                sections.sort_by(|a, b| a.label.cmp(&b.label));
            }
            SectionOrder::Severity => {
                sections.sort_by_key(|s| Reverse(section_severity(s)));
            }
        }
    }

    /// Format version groups
    pub fn format(&self, groups: &[VersionGroup]) -> String {
        self.formatter.format(groups, &self.config)
    }

    /// Generate and format in one step
    pub fn generate_formatted(&self, changes: &[AttributedChange], tags: &[TagPosition]) -> String {
        let groups = self.generate(changes, tags);
        let output = self.format(&groups);
        debug!(output_len = output.len(), "changelog formatted");
        output
    }
}

/// Highest severity among a section's changes, without the release floor
fn section_severity(section: &TypeSection) -> BumpSeverity {
    section
        .changes
        .iter()
        .map(|c| bump::descriptor_severity(&c.descriptor))
        .max()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChangeDescriptor, UNCATEGORIZED};
    use chrono::Utc;
    use monolog_git::{CommitRecord, VersionTag};

    fn change(sequence: usize, change_type: &str, title: &str) -> AttributedChange {
        let bump = match change_type {
            "feat" => Some(BumpSeverity::Minor),
            "fix" => Some(BumpSeverity::Patch),
            _ => None,
        };
        AttributedChange {
            package: "P".to_string(),
            descriptor: ChangeDescriptor::new(change_type, title).with_bump(bump),
            commit: CommitRecord::new(
                format!("{:07}abcdef", sequence),
                format!("{}: {}", change_type, title),
                "Test",
                "test@example.com",
                Utc::now(),
            ),
            sequence,
        }
    }

    fn tag(sequence: usize, version: &str) -> TagPosition {
        TagPosition {
            tag: VersionTag {
                raw: format!("P@{}", version),
                name: "P".to_string(),
                version: version.to_string(),
            },
            sequence,
            date: Utc::now(),
        }
    }

    fn titles(group: &VersionGroup, label: &str) -> Vec<String> {
        group
            .section(label)
            .map(|s| s.changes.iter().map(|c| c.descriptor.title.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_version_windows() {
        // feat a, fix b, [P@1.0.0], feat c, [P@1.1.0], fix d
        let changes = vec![
            change(0, "feat", "a"),
            change(1, "fix", "b"),
            change(3, "feat", "c"),
            change(5, "fix", "d"),
        ];
        let tags = vec![tag(2, "1.0.0"), tag(4, "1.1.0")];

        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &tags);

        let versions: Vec<&str> = groups.iter().map(|g| g.version.as_str()).collect();
        assert_eq!(versions, vec![UNRELEASED, "1.1.0", "1.0.0"]);

        assert_eq!(titles(&groups[0], "fix"), vec!["d"]);
        assert_eq!(titles(&groups[1], "feat"), vec!["c"]);
        assert_eq!(titles(&groups[2], "feat"), vec!["a"]);
        assert_eq!(titles(&groups[2], "fix"), vec!["b"]);
        assert!(groups[0].date.is_none());
        assert!(groups[1].date.is_some());
    }

    #[test]
    fn test_tagged_commit_belongs_to_its_tag() {
        let changes = vec![change(0, "feat", "a"), change(1, "fix", "b")];
        let tags = vec![tag(1, "1.0.0")];

        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &tags);

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].version, "1.0.0");
    }

    #[test]
    fn test_tag_order_does_not_matter() {
        let changes = vec![change(0, "feat", "a"), change(3, "feat", "c")];
        let tags = vec![tag(4, "1.1.0"), tag(2, "1.0.0")];

        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &tags);

        assert_eq!(groups[0].version, "1.1.0");
        assert_eq!(groups[1].version, "1.0.0");
    }

    #[test]
    fn test_same_commit_tags_use_highest_version() {
        let changes = vec![change(0, "feat", "a"), change(1, "fix", "b")];
        let tags = vec![tag(1, "1.0.1"), tag(1, "1.0.0")];

        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &tags);

        let versions: Vec<&str> = groups.iter().map(|g| g.version.as_str()).collect();
        assert_eq!(versions, vec!["1.0.1"]);

        let reversed: Vec<TagPosition> = tags.into_iter().rev().collect();
        let groups = generator.generate(&changes, &reversed);
        assert_eq!(groups[0].version, "1.0.1");
    }

    #[test]
    fn test_no_changes() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        assert!(generator.generate(&[], &[tag(0, "1.0.0")]).is_empty());
    }

    #[test]
    fn test_hidden_types_skipped_but_breaking_kept() {
        let mut breaking = change(0, "chore", "drop node 16");
        breaking.descriptor.breaking = true;
        let changes = vec![breaking, change(1, "chore", "tidy")];

        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &[]);

        assert_eq!(groups.len(), 1);
        assert!(groups[0].section("chore").is_none());
        assert_eq!(groups[0].breaking_changes.len(), 1);
    }

    #[test]
    fn test_configured_order() {
        let changes = vec![
            change(0, "docs", "d"),
            change(1, UNCATEGORIZED, "u"),
            change(2, "fix", "f"),
            change(3, "feat", "a"),
        ];
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let groups = generator.generate(&changes, &[]);

        let labels: Vec<&str> = groups[0].sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["feat", "fix", "docs", UNCATEGORIZED]);
    }

    #[test]
    fn test_alphabetical_order() {
        let changes = vec![change(0, "perf", "p"), change(1, "docs", "d"), change(2, "feat", "a")];
        let generator = ChangelogGenerator::new(ChangelogConfig::default())
            .with_order(SectionOrder::Alphabetical);
        let groups = generator.generate(&changes, &[]);

        let labels: Vec<&str> = groups[0].sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["docs", "feat", "perf"]);
    }

    #[test]
    fn test_severity_order_is_stable() {
        let changes = vec![
            change(0, "docs", "d"),
            change(1, "fix", "f"),
            change(2, "perf", "p"),
            change(3, "feat", "a"),
        ];
        let generator =
            ChangelogGenerator::new(ChangelogConfig::default()).with_order(SectionOrder::Severity);
        let groups = generator.generate(&changes, &[]);

        // docs and perf map to no bump and keep appearance order
        let labels: Vec<&str> = groups[0].sections.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["feat", "fix", "docs", "perf"]);
    }

    #[test]
    fn test_generate_formatted() {
        let generator = ChangelogGenerator::new(ChangelogConfig::default());
        let output = generator.generate_formatted(&[change(0, "feat", "add thing")], &[]);

        assert!(output.contains("Unreleased"));
        assert!(output.contains("add thing"));
    }
}
