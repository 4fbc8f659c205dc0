//! JSON changelog formatter

use monolog_core::config::ChangelogConfig;
use serde::Serialize;
use tracing::warn;

use super::ChangelogFormatter;
use crate::types::VersionGroup;

/// JSON changelog formatter
#[derive(Debug, Default)]
pub struct JsonFormatter;

#[derive(Serialize)]
struct JsonGroup<'a> {
    version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    date: Option<String>,
    breaking_changes: Vec<JsonChange<'a>>,
    sections: Vec<JsonSection<'a>>,
}

#[derive(Serialize)]
struct JsonSection<'a> {
    label: &'a str,
    title: &'a str,
    changes: Vec<JsonChange<'a>>,
}

#[derive(Serialize)]
struct JsonChange<'a> {
    #[serde(rename = "type")]
    change_type: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    breaking: bool,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<&'a str>,
}

impl JsonFormatter {
    /// Create a new JSON formatter
    pub fn new() -> Self {
        Self
    }
}

fn json_change<'a>(
    change: &'a crate::types::AttributedChange,
    config: &ChangelogConfig,
) -> JsonChange<'a> {
    JsonChange {
        change_type: &change.descriptor.change_type,
        scope: change.descriptor.scope.as_deref(),
        breaking: change.descriptor.breaking,
        title: &change.descriptor.title,
        hash: config.include_hashes.then_some(change.commit.hash.as_str()),
        author: config.include_authors.then_some(change.commit.author.as_str()),
    }
}

impl ChangelogFormatter for JsonFormatter {
    fn format(&self, groups: &[VersionGroup], config: &ChangelogConfig) -> String {
        let groups: Vec<JsonGroup<'_>> = groups
            .iter()
            .map(|group| JsonGroup {
                version: &group.version,
                date: group
                    .date
                    .filter(|_| config.include_dates)
                    .map(|d| d.format("%Y-%m-%d").to_string()),
                breaking_changes: group
                    .breaking_changes
                    .iter()
                    .map(|c| json_change(c, config))
                    .collect(),
                sections: group
                    .sections
                    .iter()
                    .map(|section| JsonSection {
                        label: &section.label,
                        title: config.section_title(&section.label),
                        changes: section.changes.iter().map(|c| json_change(c, config)).collect(),
                    })
                    .collect(),
            })
            .collect();

        serde_json::to_string_pretty(&groups).unwrap_or_else(|e| {
            warn!(error = %e, "failed to serialize changelog");
            "[]".to_string()
        })
    }

    fn name(&self) -> &'static str {
        "json"
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}
