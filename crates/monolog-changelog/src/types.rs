//! Changelog types

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use monolog_core::BumpSeverity;
use monolog_git::{CommitRecord, VersionTag};

/// Type label given to commits no grammar recognised
pub const UNCATEGORIZED: &str = "uncategorized";

/// Heading used for changes after the last tag
pub const UNRELEASED: &str = "Unreleased";

/// A structured change parsed from a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDescriptor {
    /// Commit type label (feat, fix, etc.)
    #[serde(rename = "type")]
    pub change_type: String,
    /// Scope (optional, in parentheses)
    pub scope: Option<String>,
    /// Whether this change is flagged as breaking
    pub breaking: bool,
    /// Change title
    pub title: String,
    /// Commit body
    pub body: Option<String>,
    /// Severity mapped from the type; `None` for unmapped types.
    /// The breaking override is not applied here.
    pub bump: Option<BumpSeverity>,
}

impl ChangeDescriptor {
    /// Create a non-breaking descriptor with no scope, body or bump
    pub fn new(change_type: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            change_type: change_type.into(),
            scope: None,
            breaking: false,
            title: title.into(),
            body: None,
            bump: None,
        }
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Set the breaking flag
    pub fn with_breaking(mut self, breaking: bool) -> Self {
        self.breaking = breaking;
        self
    }

    /// Set the mapped bump
    pub fn with_bump(mut self, bump: Option<BumpSeverity>) -> Self {
        self.bump = bump;
        self
    }

    /// Placeholder for a commit without recognised grammar
    pub fn uncategorized(commit: &CommitRecord) -> Self {
        let mut descriptor = Self::new(UNCATEGORIZED, commit.header.clone());
        descriptor.body = commit.body.clone();
        descriptor
    }
}

/// A change attributed to one package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttributedChange {
    /// Package the change belongs to
    pub package: String,
    /// Parsed change
    pub descriptor: ChangeDescriptor,
    /// Commit the change came from
    pub commit: CommitRecord,
    /// Position of the commit in history, oldest first
    pub sequence: usize,
}

/// A resolved version tag and where it sits in history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPosition {
    /// The resolved tag
    pub tag: VersionTag,
    /// Position of the tagged commit in history, oldest first
    pub sequence: usize,
    /// Timestamp of the tagged commit
    pub date: DateTime<Utc>,
}

impl TagPosition {
    /// Order by position in history, then by version. Of two tags on the
    /// same commit the higher version is the more recent release.
    pub fn recency(&self, other: &Self) -> Ordering {
        self.sequence
            .cmp(&other.sequence)
            .then_with(|| self.tag.semver().cmp(&other.tag.semver()))
    }
}

/// Changes of one type label inside a version group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeSection {
    /// Type label
    pub label: String,
    /// Changes in commit order
    pub changes: Vec<AttributedChange>,
}

impl TypeSection {
    /// Create an empty section
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            changes: Vec::new(),
        }
    }

    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

/// Everything published under one version of a package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionGroup {
    /// Version string, or [`UNRELEASED`]
    pub version: String,
    /// Date of the tagged commit; `None` when unreleased
    pub date: Option<DateTime<Utc>>,
    /// Sections in rendering order
    pub sections: Vec<TypeSection>,
    /// Breaking changes, highlighted separately
    pub breaking_changes: Vec<AttributedChange>,
}

impl VersionGroup {
    /// Create an empty group
    pub fn new(version: impl Into<String>, date: Option<DateTime<Utc>>) -> Self {
        Self {
            version: version.into(),
            date,
            sections: Vec::new(),
            breaking_changes: Vec::new(),
        }
    }

    /// Whether this is the unreleased group
    pub fn is_unreleased(&self) -> bool {
        self.date.is_none() && self.version == UNRELEASED
    }

    /// Find a section by label
    pub fn section(&self, label: &str) -> Option<&TypeSection> {
        self.sections.iter().find(|s| s.label == label)
    }

    /// Check if group has any content
    pub fn is_empty(&self) -> bool {
        self.sections.iter().all(TypeSection::is_empty) && self.breaking_changes.is_empty()
    }
}
