//! Grammar-driven commit message parser

use std::collections::BTreeMap;

use regex::Captures;
use tracing::trace;

use monolog_core::config::CommitsConfig;
use monolog_core::error::ChangelogError;
use monolog_core::BumpSeverity;
use monolog_git::CommitRecord;

use super::{CommitParser, GrammarSet};
use crate::types::ChangeDescriptor;

/// Type label for trailers when neither the trailer nor the header names one
const BREAKING_LABEL: &str = "breaking";

/// Parser producing one descriptor per matching header grammar plus one per
/// breaking-change trailer in the body
#[derive(Debug, Clone)]
pub struct GrammarParser {
    grammars: GrammarSet,
    types: BTreeMap<String, BumpSeverity>,
    include_merges: bool,
}

impl GrammarParser {
    /// Create a parser from compiled grammars and a type-to-bump mapping
    pub fn new(grammars: GrammarSet, types: BTreeMap<String, BumpSeverity>) -> Self {
        Self {
            grammars,
            types,
            include_merges: false,
        }
    }

    /// Compile a parser from commit configuration
    pub fn from_config(config: &CommitsConfig) -> Result<Self, ChangelogError> {
        Ok(Self::new(GrammarSet::from_config(config)?, config.types.clone())
            .with_merges(config.include_merges))
    }

    /// Whether merge commits are parsed
    pub fn with_merges(mut self, include_merges: bool) -> Self {
        self.include_merges = include_merges;
        self
    }

    fn bump_for(&self, change_type: &str) -> Option<BumpSeverity> {
        self.types.get(change_type).copied()
    }

    fn from_header(&self, caps: &Captures<'_>, body: Option<&str>) -> Option<ChangeDescriptor> {
        let change_type = caps.name("type")?.as_str().to_string();
        let title = caps.name("title")?.as_str().trim().to_string();

        Some(ChangeDescriptor {
            bump: self.bump_for(&change_type),
            scope: caps.name("scope").map(|m| m.as_str().to_string()),
            breaking: caps.name("breaking").is_some_and(|m| !m.as_str().is_empty()),
            change_type,
            title,
            body: body.map(str::to_string),
        })
    }

    /// Body text with trailer lines removed
    fn strip_trailers(&self, body: &str) -> Option<String> {
        let stripped = self
            .grammars
            .body()
            .iter()
            .fold(body.to_string(), |text, grammar| {
                grammar.replace_all(&text, "").into_owned()
            });
        let stripped = stripped.trim();
        (!stripped.is_empty()).then(|| stripped.to_string())
    }
}

impl CommitParser for GrammarParser {
    fn parse(&self, header: &str, body: Option<&str>) -> Vec<ChangeDescriptor> {
        let header = header.trim();
        let body = body.map(str::trim).filter(|b| !b.is_empty());
        let body_text = body.and_then(|b| self.strip_trailers(b));

        let mut descriptors: Vec<ChangeDescriptor> = self
            .grammars
            .header()
            .iter()
            .filter_map(|grammar| grammar.captures(header))
            .filter_map(|caps| self.from_header(&caps, body_text.as_deref()))
            .collect();

        let first_header = descriptors.first().cloned();

        if let Some(body) = body {
            for grammar in self.grammars.body() {
                for caps in grammar.captures_iter(body) {
                    let Some(title) = caps.name("title") else {
                        continue;
                    };
                    let change_type = caps
                        .name("type")
                        .map(|m| m.as_str().to_string())
                        .or_else(|| first_header.as_ref().map(|d| d.change_type.clone()))
                        .unwrap_or_else(|| BREAKING_LABEL.to_string());

                    descriptors.push(ChangeDescriptor {
                        bump: self.bump_for(&change_type),
                        scope: first_header.as_ref().and_then(|d| d.scope.clone()),
                        breaking: true,
                        change_type,
                        title: title.as_str().trim().to_string(),
                        body: None,
                    });
                }
            }
        }

        trace!(header, count = descriptors.len(), "parsed commit message");
        descriptors
    }

    fn parse_commit(&self, commit: &CommitRecord) -> Vec<ChangeDescriptor> {
        if !self.include_merges && commit.is_merge() {
            return Vec::new();
        }
        self.parse(&commit.header, commit.body.as_deref())
    }
}
