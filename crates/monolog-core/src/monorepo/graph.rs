//! Dependency graph for repository packages

use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};

use crate::config::GraphConfig;
use crate::error::{GraphError, Result};

use super::discovery::{find_manifests, ManifestWarning};
use super::manifest::{DependencyKind, DependencyProtocol, ManifestNode};

/// Which declared dependencies become graph edges
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeFilter {
    /// Dependency sections that never produce edges
    pub exclude_kinds: HashSet<DependencyKind>,
    /// Specifier protocols that never produce edges
    pub exclude_protocols: HashSet<DependencyProtocol>,
}

impl EdgeFilter {
    /// Keep every relationship
    pub fn all() -> Self {
        Self::default()
    }

    /// Keep only local relationships (`file:` and `workspace:` links)
    pub fn local_only() -> Self {
        Self::default().exclude_protocol(DependencyProtocol::Semver)
    }

    /// Exclude a dependency kind
    pub fn exclude_kind(mut self, kind: DependencyKind) -> Self {
        self.exclude_kinds.insert(kind);
        self
    }

    /// Exclude a dependency protocol
    pub fn exclude_protocol(mut self, protocol: DependencyProtocol) -> Self {
        self.exclude_protocols.insert(protocol);
        self
    }

    /// Whether a declared dependency should become an edge
    pub fn allows(&self, kind: DependencyKind, protocol: DependencyProtocol) -> bool {
        !self.exclude_kinds.contains(&kind) && !self.exclude_protocols.contains(&protocol)
    }
}

impl From<&GraphConfig> for EdgeFilter {
    fn from(config: &GraphConfig) -> Self {
        Self {
            exclude_kinds: config.exclude_kinds.iter().copied().collect(),
            exclude_protocols: config.exclude_protocols.iter().copied().collect(),
        }
    }
}

/// Directed package graph: an edge `a -> b` means `a` depends on `b`.
///
/// Cycles are allowed. Every traversal is guarded by a visited set.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, ManifestNode>,
    edges: BTreeMap<String, BTreeSet<String>>,
    reverse: BTreeMap<String, BTreeSet<String>>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from nodes, connecting declared dependencies that name
    /// another node and pass `filter`
    pub fn from_nodes(nodes: Vec<ManifestNode>, filter: &EdgeFilter) -> Result<Self> {
        let mut graph = Self::new();
        for node in nodes {
            graph.add_node(node)?;
        }

        let mut pending = Vec::new();
        for node in graph.nodes.values() {
            for (kind, dep, spec) in node.declared() {
                if dep == node.name || !graph.nodes.contains_key(dep) {
                    continue;
                }
                if filter.allows(kind, spec.protocol) {
                    pending.push((node.name.clone(), dep.to_string()));
                } else {
                    debug!(
                        from = %node.name,
                        to = dep,
                        ?kind,
                        protocol = ?spec.protocol,
                        "edge filtered out"
                    );
                }
            }
        }

        for (from, to) in pending {
            graph.add_edge(&from, &to);
        }

        debug!(nodes = graph.len(), edges = graph.edge_count(), "dependency graph built");
        Ok(graph)
    }

    /// Register a package. Names are unique.
    pub fn add_node(&mut self, node: ManifestNode) -> Result<()> {
        if let Some(existing) = self.nodes.get(&node.name) {
            return Err(GraphError::DuplicatePackage {
                name: node.name.clone(),
                first: existing.manifest_path.clone(),
                second: node.manifest_path.clone(),
            }
            .into());
        }

        self.edges.entry(node.name.clone()).or_default();
        self.reverse.entry(node.name.clone()).or_default();
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Add an edge `from -> to`
    fn add_edge(&mut self, from: &str, to: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.reverse
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    /// Number of packages
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no packages
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges
    pub fn edge_count(&self) -> usize {
        self.edges.values().map(BTreeSet::len).sum()
    }

    /// Get a package node
    pub fn get(&self, name: &str) -> Option<&ManifestNode> {
        self.nodes.get(name)
    }

    /// Get a package node, failing for names not in the graph
    pub fn require(&self, name: &str) -> Result<&ManifestNode> {
        self.get(name)
            .ok_or_else(|| GraphError::UnknownPackage(name.to_string()).into())
    }

    /// All packages, ordered by name
    pub fn nodes(&self) -> impl Iterator<Item = &ManifestNode> {
        self.nodes.values()
    }

    /// All edges as `(dependant, dependency)`, ordered
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.edges
            .iter()
            .flat_map(|(from, tos)| tos.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// The root package, if one is registered
    pub fn root(&self) -> Option<&ManifestNode> {
        self.nodes.values().find(|n| n.is_root)
    }

    /// Direct dependencies of a package
    pub fn dependencies_of(&self, name: &str) -> BTreeSet<String> {
        self.edges.get(name).cloned().unwrap_or_default()
    }

    /// Packages that depend on `name` directly
    pub fn direct_dependants(&self, name: &str) -> BTreeSet<String> {
        self.reverse.get(name).cloned().unwrap_or_default()
    }

    /// Every package with a path to `name`, excluding `name` itself
    pub fn dependants_of(&self, name: &str) -> HashSet<String> {
        Self::closure(&self.reverse, name)
    }

    /// Every package reachable from `name`, excluding `name` itself
    pub fn all_dependencies_of(&self, name: &str) -> HashSet<String> {
        Self::closure(&self.edges, name)
    }

    /// Breadth-first reachability over `adjacency`
    fn closure(adjacency: &BTreeMap<String, BTreeSet<String>>, start: &str) -> HashSet<String> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::new();
        visited.insert(start.to_string());
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            if let Some(next) = adjacency.get(current) {
                for neighbour in next {
                    if visited.insert(neighbour.clone()) {
                        queue.push_back(neighbour.as_str());
                    }
                }
            }
        }

        visited.remove(start);
        visited
    }

    /// The package owning `path`: the node whose directory is the longest
    /// component-wise prefix of `path`, else the root package.
    pub fn owner_of(&self, path: &Path) -> Option<&ManifestNode> {
        self.nodes
            .values()
            .filter(|n| path.starts_with(&n.dir))
            .max_by_key(|n| n.dir.components().count())
            .or_else(|| self.root())
    }
}

/// A built graph together with the manifests that could not be loaded
#[derive(Debug, Clone)]
pub struct GraphBuild {
    /// The dependency graph
    pub graph: DependencyGraph,
    /// Per-manifest read or parse failures
    pub warnings: Vec<ManifestWarning>,
}

/// Reads every manifest under a root and builds a [`DependencyGraph`]
#[derive(Debug, Clone)]
pub struct ManifestGraphBuilder {
    root: PathBuf,
    manifest_name: String,
    exclude_dirs: Vec<String>,
    filter: EdgeFilter,
    concurrency: usize,
}

impl ManifestGraphBuilder {
    /// Create a builder with default discovery settings
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_config(root, &GraphConfig::default())
    }

    /// Create a builder from graph configuration
    pub fn from_config(root: impl Into<PathBuf>, config: &GraphConfig) -> Self {
        Self {
            root: root.into(),
            manifest_name: config.manifest.clone(),
            exclude_dirs: config.exclude_dirs.clone(),
            filter: EdgeFilter::from(config),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Replace the edge filter
    pub fn with_filter(mut self, filter: EdgeFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Limit how many manifests are read at once
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Search root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Discover, read and parse every manifest, then build the graph.
    ///
    /// Reads run concurrently; a failing manifest becomes a warning. Only a
    /// duplicate package name fails the build.
    #[instrument(skip(self), fields(root = %self.root.display(), concurrency = self.concurrency))]
    pub async fn build(&self) -> Result<GraphBuild> {
        info!("building dependency graph");
        let (paths, mut warnings) =
            find_manifests(&self.root, &self.manifest_name, &self.exclude_dirs);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut handles = Vec::with_capacity(paths.len());

        for path in paths {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| GraphError::LoaderFailed(e.to_string()))?;

            let handle = tokio::spawn(async move {
                let result = match tokio::fs::read_to_string(&path).await {
                    Ok(content) => ManifestNode::parse(&path, &content),
                    Err(e) => Err(e.into()),
                };
                drop(permit);
                (path, result)
            });
            handles.push(handle);
        }

        // Nothing touches the graph until every read has finished.
        let mut nodes = Vec::new();
        for handle in handles {
            let (path, result) = handle
                .await
                .map_err(|e| GraphError::LoaderFailed(e.to_string()))?;
            match result {
                Ok(mut node) => {
                    node.is_root = node.dir == self.root;
                    nodes.push(node);
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "skipping manifest");
                    warnings.push(ManifestWarning::new(path, e.to_string()));
                }
            }
        }

        let graph = DependencyGraph::from_nodes(nodes, &self.filter)?;
        info!(
            packages = graph.len(),
            edges = graph.edge_count(),
            warnings = warnings.len(),
            "dependency graph ready"
        );

        Ok(GraphBuild { graph, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MonologError;
    use tempfile::TempDir;

    fn chain_graph() -> DependencyGraph {
        // a -> b -> c, a -> c
        let nodes = vec![
            ManifestNode::new("a", "/repo/a")
                .with_dependency(DependencyKind::Prod, "b", "workspace:*")
                .with_dependency(DependencyKind::Prod, "c", "workspace:*"),
            ManifestNode::new("b", "/repo/b").with_dependency(DependencyKind::Prod, "c", "^1.0.0"),
            ManifestNode::new("c", "/repo/c"),
        ];
        DependencyGraph::from_nodes(nodes, &EdgeFilter::all()).unwrap()
    }

    #[test]
    fn test_edges_follow_declared_dependencies() {
        let graph = chain_graph();
        assert_eq!(graph.edge_count(), 3);
        assert!(graph.dependencies_of("a").contains("b"));
        assert!(graph.direct_dependants("c").contains("b"));
    }

    #[test]
    fn test_dependants_of_is_transitive_and_deduplicated() {
        let graph = chain_graph();
        let dependants = graph.dependants_of("c");

        assert!(dependants.contains("a"));
        assert!(dependants.contains("b"));
        assert_eq!(dependants.len(), 2);
        assert!(!dependants.contains("c"));

        assert_eq!(graph.dependants_of("b").into_iter().collect::<Vec<_>>(), vec!["a"]);
        assert!(graph.dependants_of("a").is_empty());
    }

    #[test]
    fn test_require_unknown_package() {
        let graph = chain_graph();
        assert_eq!(graph.require("b").unwrap().name, "b");
        assert!(matches!(
            graph.require("missing"),
            Err(MonologError::Graph(GraphError::UnknownPackage(name))) if name == "missing"
        ));
    }

    #[test]
    fn test_cycle_terminates() {
        let nodes = vec![
            ManifestNode::new("a", "/repo/a")
                .with_dependency(DependencyKind::Dev, "b", "workspace:*"),
            ManifestNode::new("b", "/repo/b")
                .with_dependency(DependencyKind::Prod, "a", "workspace:*"),
        ];
        let graph = DependencyGraph::from_nodes(nodes, &EdgeFilter::all()).unwrap();

        let dependants = graph.dependants_of("a");
        assert_eq!(dependants.len(), 1);
        assert!(dependants.contains("b"));
        assert_eq!(graph.all_dependencies_of("a").len(), 1);
    }

    #[test]
    fn test_protocol_filter_keeps_local_links() {
        let nodes = vec![
            ManifestNode::new("a", "/repo/a")
                .with_dependency(DependencyKind::Prod, "b", "workspace:*")
                .with_dependency(DependencyKind::Prod, "c", "^2.0.0"),
            ManifestNode::new("b", "/repo/b"),
            ManifestNode::new("c", "/repo/c"),
        ];
        let graph = DependencyGraph::from_nodes(nodes, &EdgeFilter::local_only()).unwrap();

        assert_eq!(graph.dependencies_of("a").into_iter().collect::<Vec<_>>(), vec!["b"]);
    }

    #[test]
    fn test_kind_filter() {
        let nodes = vec![
            ManifestNode::new("a", "/repo/a")
                .with_dependency(DependencyKind::Dev, "b", "workspace:*"),
            ManifestNode::new("b", "/repo/b"),
        ];
        let filter = EdgeFilter::all().exclude_kind(DependencyKind::Dev);
        let graph = DependencyGraph::from_nodes(nodes, &filter).unwrap();

        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn test_duplicate_package_is_error() {
        let nodes = vec![
            ManifestNode::new("core", "/repo/packages/core"),
            ManifestNode::new("core", "/repo/legacy/core"),
        ];
        let result = DependencyGraph::from_nodes(nodes, &EdgeFilter::all());

        assert!(matches!(
            result,
            Err(MonologError::Graph(GraphError::DuplicatePackage { .. }))
        ));
    }

    #[test]
    fn test_owner_of_longest_prefix() {
        let nodes = vec![
            ManifestNode::new("root", "/repo").with_root(true),
            ManifestNode::new("core", "/repo/packages/core"),
            ManifestNode::new("core-plugin", "/repo/packages/core/plugins/extra"),
            ManifestNode::new("core-utils", "/repo/packages/core-utils"),
        ];
        let graph = DependencyGraph::from_nodes(nodes, &EdgeFilter::all()).unwrap();

        let owner = |p: &str| graph.owner_of(Path::new(p)).map(|n| n.name.clone());
        assert_eq!(owner("/repo/packages/core/src/index.ts").as_deref(), Some("core"));
        assert_eq!(
            owner("/repo/packages/core/plugins/extra/index.ts").as_deref(),
            Some("core-plugin")
        );
        assert_eq!(owner("/repo/packages/core-utils/a.ts").as_deref(), Some("core-utils"));
        assert_eq!(owner("/repo/README.md").as_deref(), Some("root"));
    }

    #[test]
    fn test_owner_of_without_root() {
        let graph = DependencyGraph::from_nodes(
            vec![ManifestNode::new("core", "/repo/packages/core")],
            &EdgeFilter::all(),
        )
        .unwrap();

        assert!(graph.owner_of(Path::new("/repo/scripts/build.sh")).is_none());
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn test_builder_collects_warnings() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "package.json", r#"{"name": "monorepo", "private": true}"#);
        write(
            temp.path(),
            "packages/core/package.json",
            r#"{"name": "core", "version": "1.0.0"}"#,
        );
        write(
            temp.path(),
            "packages/app/package.json",
            r#"{"name": "app", "version": "1.0.0", "dependencies": {"core": "workspace:*"}}"#,
        );
        write(temp.path(), "packages/broken/package.json", "{ nope");

        let build = ManifestGraphBuilder::new(temp.path())
            .with_concurrency(2)
            .build()
            .await
            .unwrap();

        assert_eq!(build.graph.len(), 3);
        assert_eq!(build.warnings.len(), 1);
        assert!(build.warnings[0].path.ends_with("packages/broken/package.json"));
        assert_eq!(build.graph.root().map(|n| n.name.as_str()), Some("monorepo"));
        assert!(build.graph.dependants_of("core").contains("app"));
    }

    #[tokio::test]
    async fn test_builder_duplicate_name_fails() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a/package.json", r#"{"name": "same"}"#);
        write(temp.path(), "b/package.json", r#"{"name": "same"}"#);

        let result = ManifestGraphBuilder::new(temp.path()).build().await;
        assert!(result.is_err());
    }
}
