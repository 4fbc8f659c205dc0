//! Commit message parsing

mod grammar;
mod message;

pub use grammar::GrammarSet;
pub use message::GrammarParser;

use crate::types::ChangeDescriptor;
use monolog_git::CommitRecord;

/// Trait for commit message parsers
pub trait CommitParser: Send + Sync {
    /// Parse a header and optional body into zero or more descriptors
    fn parse(&self, header: &str, body: Option<&str>) -> Vec<ChangeDescriptor>;

    /// Parse a commit read from history
    fn parse_commit(&self, commit: &CommitRecord) -> Vec<ChangeDescriptor> {
        self.parse(&commit.header, commit.body.as_deref())
    }
}
