//! Git types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A commit read from history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    /// Commit hash (full)
    pub hash: String,
    /// Short hash (first 7 characters)
    pub short_hash: String,
    /// Author name
    pub author: String,
    /// Author email
    pub author_email: String,
    /// Commit timestamp
    pub timestamp: DateTime<Utc>,
    /// Commit message header (first line)
    pub header: String,
    /// Commit message body, if any
    pub body: Option<String>,
    /// Decorations pointing at this commit, e.g. `tag: core@1.0.0`
    pub refs: Vec<String>,
    /// Distinct files touched, relative to the repository root
    pub files: Vec<String>,
}

impl CommitRecord {
    /// Create a new CommitRecord
    pub fn new(
        hash: impl Into<String>,
        header: impl Into<String>,
        author: impl Into<String>,
        author_email: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let hash = hash.into();
        let short_hash = hash.chars().take(7).collect();

        Self {
            hash,
            short_hash,
            author: author.into(),
            author_email: author_email.into(),
            timestamp,
            header: header.into(),
            body: None,
            refs: Vec::new(),
            files: Vec::new(),
        }
    }

    /// Set the commit body; blank bodies are dropped
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        let body = body.into();
        self.body = if body.trim().is_empty() {
            None
        } else {
            Some(body)
        };
        self
    }

    /// Set the ref decorations
    pub fn with_refs<I, S>(mut self, refs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.refs = refs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the touched files
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Get the full message including body
    pub fn full_message(&self) -> String {
        match &self.body {
            Some(body) => format!("{}\n\n{}", self.header, body),
            None => self.header.clone(),
        }
    }

    /// Whether this looks like a merge commit
    pub fn is_merge(&self) -> bool {
        self.header.starts_with("Merge ")
    }
}

/// A version tag resolved to a package name and semantic version
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionTag {
    /// Tag name as found, without decoration
    pub raw: String,
    /// Package name, possibly scoped (`@scope/name`)
    pub name: String,
    /// Semantic version string
    pub version: String,
}

impl VersionTag {
    /// Parsed version; always valid for tags produced by a [`crate::TagTemplate`]
    pub fn semver(&self) -> Option<semver::Version> {
        semver::Version::parse(&self.version).ok()
    }

    /// Scope part of a scoped name (`acme` for `@acme/core`)
    pub fn scope(&self) -> Option<&str> {
        self.name
            .strip_prefix('@')
            .and_then(|rest| rest.split_once('/'))
            .map(|(scope, _)| scope)
    }

    /// Name without its scope
    pub fn unscoped_name(&self) -> &str {
        match self.scope() {
            Some(_) => self.name.split_once('/').map(|(_, n)| n).unwrap_or(&self.name),
            None => &self.name,
        }
    }
}

impl std::fmt::Display for VersionTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.name, self.version)
    }
}
