//! Version tag resolution
//!
//! Tags follow a template such as `{name}@{version}`; a ref that does not
//! fit the template, or whose version is not valid semver, simply does not
//! resolve.

use regex::Regex;
use semver::Version;
use tracing::debug;

use monolog_core::error::GitError;

use crate::repository::Result;
use crate::types::VersionTag;

/// Decoration prefix `git log --decorate` puts in front of tag names
const TAG_DECORATION: &str = "tag: ";

/// Full ref prefix of tags
const TAG_REF_PREFIX: &str = "refs/tags/";

/// A compiled tag naming template
#[derive(Debug, Clone)]
pub struct TagTemplate {
    template: String,
    regex: Regex,
}

impl TagTemplate {
    /// Compile a template containing `{name}` and `{version}` placeholders
    pub fn new(template: &str) -> Result<Self> {
        let invalid = |reason: &str| GitError::InvalidTagTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        if template.matches("{name}").count() != 1 || template.matches("{version}").count() != 1 {
            return Err(invalid("needs exactly one {name} and one {version}"));
        }

        let mut pattern = String::from("^");
        let mut rest = template;
        while !rest.is_empty() {
            if let Some(after) = rest.strip_prefix("{name}") {
                pattern.push_str(r"(?P<name>(?:@[^/@\s]+/)?[^@/\s]+?)");
                rest = after;
            } else if let Some(after) = rest.strip_prefix("{version}") {
                pattern.push_str(r"(?P<version>\d+\.\d+\.\d+\S*)");
                rest = after;
            } else {
                let next = match rest.find('{') {
                    Some(0) => rest.char_indices().nth(1).map(|(i, _)| i).unwrap_or(rest.len()),
                    Some(i) => i,
                    None => rest.len(),
                };
                pattern.push_str(&regex::escape(&rest[..next]));
                rest = &rest[next..];
            }
        }
        pattern.push('$');

        let regex = Regex::new(&pattern).map_err(|e| invalid(&e.to_string()))?;
        Ok(Self {
            template: template.to_string(),
            regex,
        })
    }

    /// The template string
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Render a tag name for a package version
    pub fn format(&self, name: &str, version: &str) -> String {
        self.template
            .replace("{name}", name)
            .replace("{version}", version)
    }

    /// Resolve a single ref string.
    ///
    /// A leading `tag: ` decoration or `refs/tags/` prefix is stripped first.
    pub fn resolve(&self, raw_ref: &str) -> Option<VersionTag> {
        let raw = strip_tag_prefix(raw_ref.trim()).unwrap_or(raw_ref.trim());

        let caps = self.regex.captures(raw)?;
        let name = caps.name("name")?.as_str();
        let version = caps.name("version")?.as_str();

        if Version::parse(version).is_err() {
            debug!(tag = raw, version, "discarding tag with invalid version");
            return None;
        }

        Some(VersionTag {
            raw: raw.to_string(),
            name: name.to_string(),
            version: version.to_string(),
        })
    }

    /// Resolve every tag decoration in a commit's ref list, ignoring
    /// branches and other non-tag refs
    pub fn resolve_refs(&self, refs: &[String]) -> Vec<VersionTag> {
        refs.iter()
            .filter_map(|r| strip_tag_prefix(r.trim()))
            .filter_map(|tag| self.resolve(tag))
            .collect()
    }
}

impl Default for TagTemplate {
    fn default() -> Self {
        Self::new(monolog_core::config::DEFAULT_TAG_TEMPLATE)
            .expect("default tag template is valid")
    }
}

fn strip_tag_prefix(raw: &str) -> Option<&str> {
    raw.strip_prefix(TAG_DECORATION)
        .or_else(|| raw.strip_prefix(TAG_REF_PREFIX))
        .map(str::trim)
}

/// A partial project identifier: a package name, optionally with a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectQuery {
    /// Package name, possibly scoped
    pub name: String,
    /// Exact version to match, if given
    pub version: Option<String>,
}

impl ProjectQuery {
    /// Parse `name` or `name@version`; the leading `@` of a scoped name is
    /// part of the name
    pub fn parse(query: &str) -> Self {
        let query = query.trim();
        let split = query
            .get(1..)
            .and_then(|rest| rest.rfind('@'))
            .map(|i| i + 1);

        match split {
            Some(i) => Self {
                name: query[..i].to_string(),
                version: Some(query[i + 1..].to_string()).filter(|v| !v.is_empty()),
            },
            None => Self {
                name: query.to_string(),
                version: None,
            },
        }
    }

    /// Whether `tag` belongs to this project (and version, if one was given)
    pub fn matches(&self, tag: &VersionTag) -> bool {
        if tag.name != self.name {
            return false;
        }
        match &self.version {
            Some(version) => &tag.version == version,
            None => true,
        }
    }
}

impl std::str::FromStr for ProjectQuery {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl std::fmt::Display for ProjectQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.version {
            Some(version) => write!(f, "{}@{}", self.name, version),
            None => write!(f, "{}", self.name),
        }
    }
}
