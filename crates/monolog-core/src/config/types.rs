//! Configuration types

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::monorepo::{DependencyKind, DependencyProtocol};
use crate::types::BumpSeverity;

use super::defaults::{DEFAULT_BODY_PATTERN, DEFAULT_HEADER_PATTERN, DEFAULT_TAG_TEMPLATE};

/// Main configuration for monolog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Project name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Commit message grammars and type mapping
    pub commits: CommitsConfig,

    /// Version tag naming
    pub tags: TagsConfig,

    /// Manifest discovery and dependency graph construction
    pub graph: GraphConfig,

    /// Changelog rendering
    pub changelog: ChangelogConfig,
}

/// Commit parsing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitsConfig {
    /// Header grammars; each must capture `type` and `title`,
    /// and may capture `scope` and `breaking`
    pub header_patterns: Vec<String>,

    /// Body grammars matching breaking-change trailers; each must capture `title`
    pub body_patterns: Vec<String>,

    /// Commit type to bump severity mapping
    pub types: BTreeMap<String, BumpSeverity>,

    /// Whether merge commits are parsed
    pub include_merges: bool,
}

impl Default for CommitsConfig {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        types.insert("feat".to_string(), BumpSeverity::Minor);
        types.insert("fix".to_string(), BumpSeverity::Patch);
        types.insert("perf".to_string(), BumpSeverity::Patch);
        types.insert("revert".to_string(), BumpSeverity::Patch);

        Self {
            header_patterns: vec![DEFAULT_HEADER_PATTERN.to_string()],
            body_patterns: vec![DEFAULT_BODY_PATTERN.to_string()],
            types,
            include_merges: false,
        }
    }
}

/// Version tag configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Tag template with `{name}` and `{version}` placeholders
    pub template: String,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TAG_TEMPLATE.to_string(),
        }
    }
}

/// Dependency graph configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Manifest file name to look for
    pub manifest: String,

    /// Directory names skipped during manifest discovery
    pub exclude_dirs: Vec<String>,

    /// Dependency kinds that do not produce edges
    pub exclude_kinds: Vec<DependencyKind>,

    /// Dependency protocols that do not produce edges
    pub exclude_protocols: Vec<DependencyProtocol>,

    /// Maximum number of manifests read at once
    pub concurrency: usize,

    /// Also attribute each change to the transitive dependants of its package
    pub propagate: bool,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            manifest: "package.json".to_string(),
            exclude_dirs: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "target".to_string(),
                "dist".to_string(),
            ],
            exclude_kinds: Vec::new(),
            exclude_protocols: Vec::new(),
            concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            propagate: false,
        }
    }
}

/// How type sections are ordered inside a version group
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionOrder {
    /// Order of `changelog.order`, unknown types last
    #[default]
    Configured,
    /// Alphabetical by type label
    Alphabetical,
    /// Highest mapped bump severity first
    Severity,
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Changelog file name, relative to each package directory
    pub file: PathBuf,

    /// Changelog format (markdown, json)
    pub format: String,

    /// Section ordering mode
    pub section_order: SectionOrder,

    /// Type labels in rendering order, used by `SectionOrder::Configured`
    pub order: Vec<String>,

    /// Section titles per commit type
    pub types: BTreeMap<String, CommitTypeConfig>,

    /// Whether commits no grammar recognised get their own section
    pub include_uncategorized: bool,

    /// Whether to include commit hashes
    pub include_hashes: bool,

    /// Whether to include authors
    pub include_authors: bool,

    /// Whether to include dates
    pub include_dates: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        for (key, section, hidden) in [
            ("feat", "Features", false),
            ("fix", "Bug Fixes", false),
            ("perf", "Performance", false),
            ("revert", "Reverts", false),
            ("docs", "Documentation", false),
            ("refactor", "Refactoring", true),
            ("test", "Tests", true),
            ("build", "Build System", true),
            ("ci", "Continuous Integration", true),
            ("chore", "Chores", true),
        ] {
            types.insert(
                key.to_string(),
                CommitTypeConfig {
                    section: section.to_string(),
                    hidden,
                },
            );
        }

        Self {
            file: PathBuf::from("CHANGELOG.md"),
            format: "markdown".to_string(),
            section_order: SectionOrder::Configured,
            order: ["feat", "fix", "perf", "revert", "docs"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            types,
            include_uncategorized: false,
            include_hashes: true,
            include_authors: false,
            include_dates: true,
        }
    }
}

impl ChangelogConfig {
    /// Section title for a type label, falling back to the label itself
    pub fn section_title<'a>(&'a self, label: &'a str) -> &'a str {
        self.types
            .get(label)
            .map(|t| t.section.as_str())
            .unwrap_or(label)
    }

    /// Whether a type label is hidden from rendered output
    pub fn is_hidden(&self, label: &str) -> bool {
        self.types.get(label).is_some_and(|t| t.hidden)
    }
}

/// Configuration for a commit type section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitTypeConfig {
    /// Section title in changelog
    pub section: String,

    /// Whether to hide from changelog
    #[serde(default)]
    pub hidden: bool,
}
