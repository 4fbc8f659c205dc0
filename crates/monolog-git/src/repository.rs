//! Git repository operations

use std::path::{Path, PathBuf};

use git2::Repository;
use tracing::{debug, info, instrument};

use monolog_core::error::GitError;

/// Result type for git operations
pub type Result<T> = std::result::Result<T, GitError>;

/// Name of the directory marking a repository root
const GIT_MARKER: &str = ".git";

/// Walk upward from `start` to the filesystem root looking for a `.git` marker.
///
/// Returns the directory containing the marker.
pub fn find_repo_root(start: &Path) -> Result<PathBuf> {
    let mut current = if start.is_absolute() {
        start.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|e| GitError::OpenFailed(e.to_string()))?
            .join(start)
    };

    loop {
        if current.join(GIT_MARKER).exists() {
            debug!(root = %current.display(), "found repository root");
            return Ok(current);
        }

        if !current.pop() {
            return Err(GitError::RepositoryNotFound(start.to_path_buf()));
        }
    }
}

/// Git repository wrapper
pub struct GitRepo {
    pub(crate) repo: Repository,
    path: PathBuf,
}

impl GitRepo {
    /// Open a repository at the given path
    #[instrument(fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::RepositoryNotFound(path.to_path_buf())
            } else {
                GitError::OpenFailed(e.to_string())
            }
        })?;

        Ok(Self {
            path: path.to_path_buf(),
            repo,
        })
    }

    /// Discover and open a repository by searching parent directories
    #[instrument(fields(start_path = %start_path.display()))]
    pub fn discover(start_path: &Path) -> Result<Self> {
        info!(start_path = %start_path.display(), "discovering git repository");
        let root = find_repo_root(start_path)?;
        Self::open(&root)
    }

    /// Get the repository root (working directory) path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether HEAD points at a commit yet
    pub fn has_commits(&self) -> bool {
        self.repo.head().and_then(|h| h.peel_to_commit()).is_ok()
    }
}
