//! Release planning
//!
//! Wires graph building, history reading, tag resolution, attribution, bump
//! calculation and grouping into a per-package report.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use monolog_core::config::Config;
use monolog_core::error::{ConfigError, MonologError};
use monolog_core::monorepo::ManifestWarning;
use monolog_core::{BumpSeverity, DependencyGraph, ManifestGraphBuilder, ManifestNode, Result};
use monolog_git::{find_repo_root, CommitRecord, GitRepo, ProjectQuery, TagTemplate};

use crate::attribution::{Attribution, ChangeAttributor};
use crate::bump;
use crate::formatter::FormatterRegistry;
use crate::generator::ChangelogGenerator;
use crate::parser::GrammarParser;
use crate::types::{TagPosition, VersionGroup};

/// Everything read from disk for one repository
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Repository root
    pub root: PathBuf,
    /// Package dependency graph
    pub graph: DependencyGraph,
    /// Manifests that could not be loaded
    pub warnings: Vec<ManifestWarning>,
    /// History, oldest first
    pub commits: Vec<CommitRecord>,
}

/// Release state of one package
#[derive(Debug, Clone, Serialize)]
pub struct PackageReport {
    /// Package name
    pub name: String,
    /// Version of the latest tag, else the manifest version
    pub current_version: Option<String>,
    /// Severity of the changes since the latest tag
    pub bump: BumpSeverity,
    /// Version after applying `bump`, when there is something to release
    pub next_version: Option<String>,
    /// Whether the package is marked private
    pub private: bool,
    /// Changelog groups, newest first
    pub groups: Vec<VersionGroup>,
}

impl PackageReport {
    /// Whether the package has unreleased changes warranting a release
    pub fn needs_release(&self) -> bool {
        self.bump.is_release()
    }
}

/// Result of planning a whole repository
#[derive(Debug, Clone, Serialize)]
pub struct ReleasePlan {
    /// One report per package, by name
    pub packages: Vec<PackageReport>,
    /// Every resolved version tag, oldest first
    pub tags: Vec<TagPosition>,
    /// Commits touching a package that no grammar recognised
    pub uncategorized: usize,
}

impl ReleasePlan {
    /// Look up a package report by name
    pub fn package(&self, name: &str) -> Option<&PackageReport> {
        self.packages.iter().find(|p| p.name == name)
    }
}

/// Plans releases from configuration
pub struct ReleasePlanner {
    config: Config,
}

impl ReleasePlanner {
    /// Create a planner
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The configuration in use
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Read the graph and history of the repository containing `start`.
    ///
    /// History is read on a blocking thread while manifests load.
    #[instrument(skip(self), fields(start = %start.display()))]
    pub async fn load(&self, start: &Path) -> Result<Workspace> {
        let root = find_repo_root(start)?;
        info!(root = %root.display(), "loading workspace");

        let history_root = root.clone();
        let history = tokio::task::spawn_blocking(move || GitRepo::open(&history_root)?.history());

        let build = ManifestGraphBuilder::from_config(&root, &self.config.graph)
            .build()
            .await?;
        let commits = history
            .await
            .map_err(|e| MonologError::other(format!("history reader failed: {}", e)))??;

        Ok(Workspace {
            root,
            graph: build.graph,
            warnings: build.warnings,
            commits,
        })
    }

    /// Compile the configured tag template
    pub fn tag_template(&self) -> Result<TagTemplate> {
        Ok(TagTemplate::new(&self.config.tags.template)?)
    }

    /// Resolve tags on every commit, oldest first
    pub fn resolve_tags(&self, commits: &[CommitRecord]) -> Result<Vec<TagPosition>> {
        let template = self.tag_template()?;
        Ok(resolve_tags(&template, commits))
    }

    /// A generator using the configured changelog format
    pub fn generator(&self) -> Result<ChangelogGenerator> {
        let format = &self.config.changelog.format;
        let formatter = FormatterRegistry::new().get(format).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "changelog.format".to_string(),
                message: format!("unknown format '{}'", format),
            }
        })?;
        Ok(ChangelogGenerator::new(self.config.changelog.clone()).with_shared_formatter(formatter))
    }

    /// Attribute history to packages
    pub fn attribute(&self, workspace: &Workspace) -> Result<Attribution> {
        let parser = GrammarParser::from_config(&self.config.commits)?;
        Ok(
            ChangeAttributor::new(&workspace.graph, &workspace.root, &parser)
                .with_propagation(self.config.graph.propagate)
                .attribute(&workspace.commits),
        )
    }

    /// Plan every package in `workspace`
    #[instrument(
        skip_all,
        fields(packages = workspace.graph.len(), commits = workspace.commits.len())
    )]
    pub fn plan(&self, workspace: &Workspace) -> Result<ReleasePlan> {
        let tags = self.resolve_tags(&workspace.commits)?;
        let attribution = self.attribute(workspace)?;
        let generator = self.generator()?;

        let packages: Vec<PackageReport> = workspace
            .graph
            .nodes()
            .map(|node| self.report(node, &attribution, &tags, &generator))
            .collect();

        info!(
            packages = packages.len(),
            releases = packages.iter().filter(|p| p.needs_release()).count(),
            "release plan ready"
        );

        Ok(ReleasePlan {
            packages,
            tags,
            uncategorized: attribution.uncategorized_count(),
        })
    }

    fn report(
        &self,
        node: &ManifestNode,
        attribution: &Attribution,
        tags: &[TagPosition],
        generator: &ChangelogGenerator,
    ) -> PackageReport {
        let query = ProjectQuery {
            name: node.name.clone(),
            version: None,
        };
        let package_tags: Vec<TagPosition> =
            tags.iter().filter(|t| query.matches(&t.tag)).cloned().collect();

        let latest = package_tags.iter().max_by(|a, b| a.recency(b));

        let current_version = latest
            .map(|t| t.tag.version.clone())
            .or_else(|| node.version.clone());

        let bump = bump::calculate_since(attribution.changes_for(&node.name), latest);

        let next_version = current_version
            .as_deref()
            .filter(|_| bump.is_release())
            .and_then(|v| semver::Version::parse(v).ok())
            .map(|v| bump.apply(&v).to_string());

        let entries =
            attribution.entries(&node.name, self.config.changelog.include_uncategorized);
        let groups = generator.generate(&entries, &package_tags);

        debug!(
            package = %node.name,
            current = ?current_version,
            %bump,
            next = ?next_version,
            "package planned"
        );

        PackageReport {
            name: node.name.clone(),
            current_version,
            bump,
            next_version,
            private: node.private,
            groups,
        }
    }
}

/// Resolve tags on every commit, oldest first
pub fn resolve_tags(template: &TagTemplate, commits: &[CommitRecord]) -> Vec<TagPosition> {
    commits
        .iter()
        .enumerate()
        .flat_map(|(sequence, commit)| {
            template
                .resolve_refs(&commit.refs)
                .into_iter()
                .map(move |tag| TagPosition {
                    tag,
                    sequence,
                    date: commit.timestamp,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Oid, Repository, Signature};
    use tempfile::TempDir;

    fn write(root: &Path, file: &str, content: &str) {
        let path = root.join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn commit(repo: &Repository, root: &Path, files: &[&str], message: &str) -> Oid {
        let sig = Signature::now("Test", "test@example.com").unwrap();
        let mut index = repo.index().unwrap();
        for file in files {
            if !file.ends_with("package.json") {
                write(root, file, message);
            }
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

    fn tag(repo: &Repository, oid: Oid, name: &str) {
        repo.tag_lightweight(name, &repo.find_object(oid, None).unwrap(), false)
            .unwrap();
    }

    /// Root, `core` and `app` (depending on `core`), with an initial commit
    fn setup() -> (TempDir, Repository) {
        let temp = TempDir::new().unwrap();
        let repo = Repository::init(temp.path()).unwrap();
        let root = temp.path();

        write(root, "package.json", r#"{"name": "monorepo", "private": true}"#);
        write(
            root,
            "packages/core/package.json",
            r#"{"name": "core", "version": "1.0.0"}"#,
        );
        write(
            root,
            "packages/app/package.json",
            r#"{"name": "app", "version": "0.3.0", "dependencies": {"core": "workspace:*"}}"#,
        );
        commit(
            &repo,
            root,
            &[
                "package.json",
                "packages/core/package.json",
                "packages/app/package.json",
            ],
            "chore: init",
        );

        (temp, repo)
    }

    async fn plan(root: &Path, config: Config) -> ReleasePlan {
        let planner = ReleasePlanner::new(config);
        let workspace = planner.load(root).await.unwrap();
        planner.plan(&workspace).unwrap()
    }

    #[tokio::test]
    async fn test_feature_bumps_owning_package_only() {
        let (temp, repo) = setup();
        let init = repo.head().unwrap().peel_to_commit().unwrap().id();
        tag(&repo, init, "core@1.0.0");
        tag(&repo, init, "app@0.3.0");
        commit(&repo, temp.path(), &["packages/core/src/index.ts"], "feat: add thing");

        let plan = plan(temp.path(), Config::default()).await;

        let core = plan.package("core").unwrap();
        assert_eq!(core.bump, BumpSeverity::Minor);
        assert_eq!(core.current_version.as_deref(), Some("1.0.0"));
        assert_eq!(core.next_version.as_deref(), Some("1.1.0"));

        let app = plan.package("app").unwrap();
        assert_eq!(app.bump, BumpSeverity::None);
        assert!(app.next_version.is_none());
    }

    #[tokio::test]
    async fn test_breaking_trailer_forces_major() {
        let (temp, repo) = setup();
        let init = repo.head().unwrap().peel_to_commit().unwrap().id();
        tag(&repo, init, "core@1.0.0");
        commit(&repo, temp.path(), &["packages/core/a.ts"], "fix: correct a");
        commit(&repo, temp.path(), &["packages/core/b.ts"], "feat: add b");
        commit(
            &repo,
            temp.path(),
            &["packages/core/c.ts"],
            "feat: rework c\n\nBREAKING CHANGE: removes X",
        );

        let plan = plan(temp.path(), Config::default()).await;
        let core = plan.package("core").unwrap();

        assert_eq!(core.bump, BumpSeverity::Major);
        assert_eq!(core.next_version.as_deref(), Some("2.0.0"));
        assert_eq!(core.groups.len(), 1);
        assert!(core.groups[0].is_unreleased());
        assert_eq!(core.groups[0].breaking_changes.len(), 1);
    }

    #[tokio::test]
    async fn test_versions_grouped_by_tag() {
        let (temp, repo) = setup();
        commit(&repo, temp.path(), &["packages/core/a.ts"], "feat: first");
        let released = commit(&repo, temp.path(), &["packages/core/b.ts"], "fix: second");
        tag(&repo, released, "core@1.1.0");
        commit(&repo, temp.path(), &["packages/core/c.ts"], "fix: third");

        let plan = plan(temp.path(), Config::default()).await;
        let core = plan.package("core").unwrap();

        let versions: Vec<&str> = core.groups.iter().map(|g| g.version.as_str()).collect();
        assert_eq!(versions, vec!["Unreleased", "1.1.0"]);
        assert_eq!(core.current_version.as_deref(), Some("1.1.0"));
        assert_eq!(core.bump, BumpSeverity::Patch);
        assert_eq!(core.next_version.as_deref(), Some("1.1.1"));
        assert_eq!(plan.tags.len(), 1);
    }

    #[tokio::test]
    async fn test_double_tagged_commit_agrees_on_version() {
        let (temp, repo) = setup();
        let released = commit(&repo, temp.path(), &["packages/core/a.ts"], "feat: first");
        tag(&repo, released, "core@1.0.1");
        tag(&repo, released, "core@1.0.0");
        commit(&repo, temp.path(), &["packages/core/b.ts"], "fix: second");

        let plan = plan(temp.path(), Config::default()).await;
        let core = plan.package("core").unwrap();

        let versions: Vec<&str> = core.groups.iter().map(|g| g.version.as_str()).collect();
        assert_eq!(versions, vec!["Unreleased", "1.0.1"]);
        assert_eq!(core.current_version.as_deref(), Some("1.0.1"));
        assert_eq!(core.next_version.as_deref(), Some("1.0.2"));
    }

    #[tokio::test]
    async fn test_untagged_package_uses_manifest_version() {
        let (temp, repo) = setup();
        commit(&repo, temp.path(), &["packages/app/main.ts"], "feat: app screen");

        let plan = plan(temp.path(), Config::default()).await;
        let app = plan.package("app").unwrap();

        assert_eq!(app.current_version.as_deref(), Some("0.3.0"));
        assert_eq!(app.next_version.as_deref(), Some("0.4.0"));
    }

    #[tokio::test]
    async fn test_propagation_opt_in() {
        let (temp, repo) = setup();
        let init = repo.head().unwrap().peel_to_commit().unwrap().id();
        tag(&repo, init, "core@1.0.0");
        tag(&repo, init, "app@0.3.0");
        commit(&repo, temp.path(), &["packages/core/a.ts"], "fix: core bug");

        let mut config = Config::default();
        config.graph.propagate = true;
        let plan = plan(temp.path(), config).await;

        assert_eq!(plan.package("app").unwrap().bump, BumpSeverity::Patch);
    }

    #[tokio::test]
    async fn test_uncategorized_counted() {
        let (temp, repo) = setup();
        commit(&repo, temp.path(), &["packages/core/a.ts"], "Tweak things");

        let plan = plan(temp.path(), Config::default()).await;
        // The init commit touches all three packages too but parses as chore.
        assert_eq!(plan.uncategorized, 1);
        assert!(plan.package("core").unwrap().groups.is_empty());
    }

    #[test]
    fn test_resolve_tags_scenario() {
        let record = CommitRecord::new(
            "abc1234",
            "chore: release",
            "A",
            "a@example.com",
            chrono::Utc::now(),
        )
        .with_refs(monolog_git::split_refs("tag: core@2.0.0, tag: unrelated-marker"));

        let tags = resolve_tags(&TagTemplate::default(), &[record]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].tag.name, "core");
        assert_eq!(tags[0].tag.version, "2.0.0");
        assert_eq!(tags[0].sequence, 0);
    }

    #[test]
    fn test_generator_rejects_unknown_format() {
        let mut config = Config::default();
        config.changelog.format = "html".to_string();
        assert!(ReleasePlanner::new(config).generator().is_err());
    }
}
