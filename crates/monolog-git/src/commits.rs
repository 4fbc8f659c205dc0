//! Commit history operations

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use git2::{Oid, Sort};
use tracing::{debug, info, instrument};

use monolog_core::error::GitError;

use crate::repository::{GitRepo, Result};
use crate::types::CommitRecord;

impl GitRepo {
    /// Read the full history reachable from HEAD, oldest first.
    ///
    /// Parents always precede their children and the order is stable across
    /// runs. An empty repository yields no commits.
    #[instrument(skip(self), fields(path = %self.path().display()))]
    pub fn history(&self) -> Result<Vec<CommitRecord>> {
        self.read_history(None)
    }

    /// Read history after `since` (exclusive), oldest first
    #[instrument(skip(self), fields(path = %self.path().display()))]
    pub fn history_since(&self, since: &str) -> Result<Vec<CommitRecord>> {
        // Tag names like `core@1.0.0` are looked up directly; `@` has its own
        // meaning in revision syntax.
        let commit = self
            .repo
            .find_reference(&format!("refs/tags/{}", since))
            .and_then(|r| r.peel_to_commit())
            .or_else(|_| {
                self.repo
                    .revparse_single(since)
                    .and_then(|obj| obj.peel_to_commit())
            })
            .map_err(|_| GitError::UnknownRevision(since.to_string()))?;
        self.read_history(Some(commit.id()))
    }

    /// Get a specific commit by hash
    pub fn get_commit(&self, hash: &str) -> Result<CommitRecord> {
        let oid = Oid::from_str(hash)?;
        let commit = self.repo.find_commit(oid)?;
        let decorations = self.decorations()?;
        self.commit_to_record(&commit, &decorations)
    }

    fn read_history(&self, hide: Option<Oid>) -> Result<Vec<CommitRecord>> {
        if !self.has_commits() {
            debug!("repository has no commits");
            return Ok(Vec::new());
        }

        let decorations = self.decorations()?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
        revwalk.push_head()?;
        if let Some(oid) = hide {
            revwalk.hide(oid)?;
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(self.commit_to_record(&commit, &decorations)?);
        }

        info!(count = commits.len(), "read commit history");
        Ok(commits)
    }

    /// Map each commit to the refs pointing at it, in `git log --decorate` form
    fn decorations(&self) -> Result<HashMap<Oid, Vec<String>>> {
        let head_branch = self
            .repo
            .head()
            .ok()
            .filter(|h| h.is_branch())
            .and_then(|h| h.shorthand().map(str::to_string));

        let mut decorations: HashMap<Oid, Vec<String>> = HashMap::new();

        for reference in self.repo.references()? {
            let reference = reference?;
            let Some(short) = reference.shorthand().map(str::to_string) else {
                continue;
            };

            let label = if reference.is_tag() {
                format!("tag: {}", short)
            } else if reference.is_branch() {
                if head_branch.as_deref() == Some(short.as_str()) {
                    format!("HEAD -> {}", short)
                } else {
                    short
                }
            } else if reference.is_remote() {
                short
            } else {
                continue;
            };

            // Refs that do not resolve to a commit (e.g. tags on trees) are skipped.
            if let Ok(commit) = reference.peel_to_commit() {
                decorations.entry(commit.id()).or_default().push(label);
            }
        }

        for refs in decorations.values_mut() {
            refs.sort();
        }

        Ok(decorations)
    }

    /// Distinct paths touched by `commit` relative to its first parent
    fn changed_files(&self, commit: &git2::Commit<'_>) -> Result<Vec<String>> {
        let tree = commit.tree()?;
        let parent_tree = match commit.parent_count() {
            0 => None,
            _ => Some(commit.parent(0)?.tree()?),
        };

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;

        let mut files = BTreeSet::new();
        for delta in diff.deltas() {
            for path in [delta.old_file().path(), delta.new_file().path()]
                .into_iter()
                .flatten()
            {
                files.insert(path.to_string_lossy().replace('\\', "/"));
            }
        }

        Ok(files.into_iter().collect())
    }

    fn commit_to_record(
        &self,
        commit: &git2::Commit<'_>,
        decorations: &HashMap<Oid, Vec<String>>,
    ) -> Result<CommitRecord> {
        let author = commit.author();
        let header = commit.summary().unwrap_or("(no message)").to_string();

        let timestamp = commit_time(commit.time().seconds());

        let record = CommitRecord::new(
            commit.id().to_string(),
            header,
            author.name().unwrap_or("Unknown"),
            author.email().unwrap_or("unknown@example.com"),
            timestamp,
        )
        .with_body(commit.body().unwrap_or_default())
        .with_refs(decorations.get(&commit.id()).cloned().unwrap_or_default())
        .with_files(self.changed_files(commit)?);

        Ok(record)
    }
}

/// Split a `git log --decorate` ref string such as
/// `(HEAD -> main, tag: core@2.0.0)` into its entries
pub fn split_refs(raw: &str) -> Vec<String> {
    raw.trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

/// Commit timestamp; out-of-range values fall back to the epoch
fn commit_time(seconds: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository, Signature};
    use std::path::Path;
    use tempfile::TempDir;

    fn commit_files(repo: &Repository, root: &Path, files: &[&str], message: &str) -> Oid {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        for file in files {
            let path = root.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, message).unwrap();
            index.add_path(Path::new(file)).unwrap();
        }
        index.write().unwrap();

        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let parents = match repo.head().ok().and_then(|h| h.peel_to_commit().ok()) {
            Some(parent) => vec![parent],
            None => vec![],
        };
        let parent_refs: Vec<&git2::Commit<'_>> = parents.iter().collect();

        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
            .unwrap()
    }

    fn setup_repo() -> (TempDir, GitRepo) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();

        commit_files(&repo, temp.path(), &["package.json"], "chore: init");
        let tagged = commit_files(
            &repo,
            temp.path(),
            &["packages/core/src/index.ts", "packages/core/package.json"],
            "feat(core): add thing\n\nLonger explanation.",
        );
        repo.tag_lightweight("core@1.0.0", &repo.find_object(tagged, None).unwrap(), false)
            .unwrap();
        commit_files(&repo, temp.path(), &["packages/app/main.ts"], "fix: app bug");

        let git_repo = GitRepo::open(temp.path()).unwrap();
        (temp, git_repo)
    }

    #[test]
    fn test_history_is_oldest_first() {
        let (_temp, repo) = setup_repo();
        let commits = repo.history().unwrap();

        let headers: Vec<&str> = commits.iter().map(|c| c.header.as_str()).collect();
        assert_eq!(headers, vec!["chore: init", "feat(core): add thing", "fix: app bug"]);
        assert_eq!(commits[1].body.as_deref(), Some("Longer explanation."));
    }

    #[test]
    fn test_history_changed_files() {
        let (_temp, repo) = setup_repo();
        let commits = repo.history().unwrap();

        assert_eq!(commits[0].files, vec!["package.json"]);
        assert_eq!(
            commits[1].files,
            vec!["packages/core/package.json", "packages/core/src/index.ts"]
        );
        assert_eq!(commits[2].files, vec!["packages/app/main.ts"]);
    }

    #[test]
    fn test_history_refs() {
        let (_temp, repo) = setup_repo();
        let commits = repo.history().unwrap();

        assert_eq!(commits[1].refs, vec!["tag: core@1.0.0"]);
        assert!(commits[2].refs.iter().any(|r| r.starts_with("HEAD -> ")));
        assert!(commits[0].refs.is_empty());
    }

    #[test]
    fn test_history_since_tag() {
        let (_temp, repo) = setup_repo();
        let commits = repo.history_since("core@1.0.0").unwrap();

        assert_eq!(commits.len(), 1);
        assert_eq!(commits[0].header, "fix: app bug");
    }

    #[test]
    fn test_history_since_unknown_revision() {
        let (_temp, repo) = setup_repo();
        assert!(matches!(
            repo.history_since("nope@9.9.9"),
            Err(GitError::UnknownRevision(_))
        ));
    }

    #[test]
    fn test_history_empty_repo() {
        let temp = TempDir::new().unwrap();
        Repository::init(temp.path()).unwrap();
        let repo = GitRepo::open(temp.path()).unwrap();

        assert!(repo.history().unwrap().is_empty());
    }

    #[test]
    fn test_get_commit() {
        let (_temp, repo) = setup_repo();
        let latest = repo.history().unwrap().pop().unwrap();
        let fetched = repo.get_commit(&latest.hash).unwrap();
        assert_eq!(fetched, latest);
    }

    #[test]
    fn test_split_refs() {
        assert_eq!(
            split_refs("tag: core@2.0.0, tag: unrelated-marker"),
            vec!["tag: core@2.0.0", "tag: unrelated-marker"]
        );
        assert_eq!(
            split_refs(" (HEAD -> main, origin/main) "),
            vec!["HEAD -> main", "origin/main"]
        );
        assert!(split_refs("").is_empty());
    }

    #[test]
    fn test_commit_time_is_deterministic() {
        assert_eq!(commit_time(1_700_000_000).timestamp(), 1_700_000_000);
        assert_eq!(commit_time(-3600).timestamp(), -3600);
        assert_eq!(commit_time(i64::MAX), DateTime::<Utc>::UNIX_EPOCH);
        assert_eq!(commit_time(i64::MIN), commit_time(i64::MAX));
    }
}
