//! Attribution of commits to the packages they touch

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use monolog_core::DependencyGraph;
use monolog_git::CommitRecord;

use crate::parser::CommitParser;
use crate::types::{AttributedChange, ChangeDescriptor};

/// Per-package changes, in commit order
#[derive(Debug, Clone, Default)]
pub struct Attribution {
    changes: BTreeMap<String, Vec<AttributedChange>>,
    uncategorized: BTreeMap<String, Vec<AttributedChange>>,
}

impl Attribution {
    /// Parsed changes attributed to `package`
    pub fn changes_for(&self, package: &str) -> &[AttributedChange] {
        self.changes.get(package).map(Vec::as_slice).unwrap_or_default()
    }

    /// Commits touching `package` that no grammar recognised
    pub fn uncategorized_for(&self, package: &str) -> &[AttributedChange] {
        self.uncategorized
            .get(package)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Changes for `package` in commit order, optionally interleaving
    /// uncategorized commits
    pub fn entries(&self, package: &str, include_uncategorized: bool) -> Vec<AttributedChange> {
        let mut entries = self.changes_for(package).to_vec();
        if include_uncategorized {
            entries.extend_from_slice(self.uncategorized_for(package));
            entries.sort_by_key(|c| c.sequence);
        }
        entries
    }

    /// Packages with at least one parsed change
    pub fn packages(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Total number of uncategorized commit attributions
    pub fn uncategorized_count(&self) -> usize {
        self.uncategorized.values().map(Vec::len).sum()
    }
}

/// Attributes each commit's changes to the packages owning its files
pub struct ChangeAttributor<'a> {
    graph: &'a DependencyGraph,
    repo_root: PathBuf,
    parser: &'a dyn CommitParser,
    propagate: bool,
}

impl<'a> ChangeAttributor<'a> {
    /// Create an attributor for a graph rooted at `repo_root`
    pub fn new(
        graph: &'a DependencyGraph,
        repo_root: impl Into<PathBuf>,
        parser: &'a dyn CommitParser,
    ) -> Self {
        Self {
            graph,
            repo_root: repo_root.into(),
            parser,
            propagate: false,
        }
    }

    /// Also attribute changes to every dependant of a touched package
    pub fn with_propagation(mut self, propagate: bool) -> Self {
        self.propagate = propagate;
        self
    }

    /// Packages touched by `commit`
    pub fn touched_packages(&self, commit: &CommitRecord) -> BTreeSet<String> {
        let mut packages: BTreeSet<String> = commit
            .files
            .iter()
            .filter_map(|file| self.owner_of(file))
            .collect();

        if self.propagate {
            let dependants: Vec<String> = packages
                .iter()
                .flat_map(|name| self.graph.dependants_of(name))
                .collect();
            packages.extend(dependants);
        }

        packages
    }

    fn owner_of(&self, file: &str) -> Option<String> {
        let path: PathBuf = self.repo_root.join(Path::new(file));
        self.graph.owner_of(&path).map(|node| node.name.clone())
    }

    /// Attribute every commit in `commits`, which must be oldest first
    #[instrument(skip_all, fields(commits = commits.len()))]
    pub fn attribute(&self, commits: &[CommitRecord]) -> Attribution {
        let mut attribution = Attribution::default();

        for (sequence, commit) in commits.iter().enumerate() {
            let packages = self.touched_packages(commit);
            if packages.is_empty() {
                debug!(commit = %commit.short_hash, "commit touches no package");
                continue;
            }

            let descriptors = self.parser.parse_commit(commit);
            if descriptors.is_empty() {
                let descriptor = ChangeDescriptor::uncategorized(commit);
                for package in &packages {
                    attribution
                        .uncategorized
                        .entry(package.clone())
                        .or_default()
                        .push(AttributedChange {
                            package: package.clone(),
                            descriptor: descriptor.clone(),
                            commit: commit.clone(),
                            sequence,
                        });
                }
                continue;
            }

            for package in &packages {
                let changes = attribution.changes.entry(package.clone()).or_default();
                for descriptor in &descriptors {
                    changes.push(AttributedChange {
                        package: package.clone(),
                        descriptor: descriptor.clone(),
                        commit: commit.clone(),
                        sequence,
                    });
                }
            }
        }

        info!(
            packages = attribution.changes.len(),
            uncategorized = attribution.uncategorized_count(),
            "attributed changes"
        );
        attribution
    }
}
