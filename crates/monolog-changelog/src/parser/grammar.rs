//! Commit message grammars

use regex::Regex;

use monolog_core::config::{CommitsConfig, DEFAULT_BODY_PATTERN, DEFAULT_HEADER_PATTERN};
use monolog_core::error::ChangelogError;

/// Compiled header and body grammars.
///
/// Header grammars capture `type` and `title`, optionally `scope` and
/// `breaking`. Body grammars match breaking-change trailers and capture
/// `title`, optionally `type`.
#[derive(Debug, Clone)]
pub struct GrammarSet {
    header: Vec<Regex>,
    body: Vec<Regex>,
}

impl GrammarSet {
    /// Compile grammars from pattern strings
    pub fn from_patterns<S: AsRef<str>>(
        header: &[S],
        body: &[S],
    ) -> Result<Self, ChangelogError> {
        Ok(Self {
            header: compile(header)?,
            body: compile(body)?,
        })
    }

    /// Compile the grammars configured for commits
    pub fn from_config(config: &CommitsConfig) -> Result<Self, ChangelogError> {
        Self::from_patterns(config.header_patterns.as_slice(), config.body_patterns.as_slice())
    }

    /// Conventional Commits header plus the `BREAKING CHANGE:` trailer
    pub fn conventional() -> Result<Self, ChangelogError> {
        Self::from_patterns(&[DEFAULT_HEADER_PATTERN], &[DEFAULT_BODY_PATTERN])
    }

    /// Header grammars
    pub fn header(&self) -> &[Regex] {
        &self.header
    }

    /// Body grammars
    pub fn body(&self) -> &[Regex] {
        &self.body
    }
}

fn compile<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<Regex>, ChangelogError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p.as_ref()).map_err(|e| ChangelogError::InvalidGrammar {
                pattern: p.as_ref().to_string(),
                reason: e.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conventional_compiles() {
        let grammars = GrammarSet::conventional().unwrap();
        assert_eq!(grammars.header().len(), 1);
        assert_eq!(grammars.body().len(), 1);
    }

    #[test]
    fn test_invalid_pattern() {
        let result = GrammarSet::from_patterns(&["(?P<type>"], &[]);
        assert!(matches!(result, Err(ChangelogError::InvalidGrammar { .. })));
    }
}
