//! Package manifest parsing

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Section of a manifest a dependency is declared in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// `dependencies`
    Prod,
    /// `devDependencies`
    Dev,
    /// `peerDependencies`
    Peer,
    /// `optionalDependencies`
    Optional,
}

/// How a dependency specifier resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyProtocol {
    /// Registry version range, e.g. `^1.2.0`
    Semver,
    /// Local path, e.g. `file:../core` or `../core`
    File,
    /// Workspace link, e.g. `workspace:*`
    Workspace,
}

impl DependencyProtocol {
    /// Classify a raw specifier string
    pub fn classify(specifier: &str) -> Self {
        let spec = specifier.trim();
        if spec.starts_with("workspace:") {
            Self::Workspace
        } else if spec.starts_with("file:")
            || spec.starts_with("link:")
            || spec.starts_with("./")
            || spec.starts_with("../")
            || spec.starts_with('/')
        {
            Self::File
        } else {
            Self::Semver
        }
    }
}

/// A declared dependency specifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    /// Raw specifier as written in the manifest
    pub specifier: String,
    /// Resolution protocol
    pub protocol: DependencyProtocol,
}

impl DependencySpec {
    /// Create a spec, classifying its protocol
    pub fn new(specifier: impl Into<String>) -> Self {
        let specifier = specifier.into();
        let protocol = DependencyProtocol::classify(&specifier);
        Self {
            specifier,
            protocol,
        }
    }
}

/// A package in the repository, read from its manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestNode {
    /// Package name, unique within a graph
    pub name: String,
    /// Declared version, if any
    pub version: Option<String>,
    /// Absolute package directory
    pub dir: PathBuf,
    /// Path to the manifest file
    pub manifest_path: PathBuf,
    /// Declared dependencies per section
    pub dependencies: BTreeMap<DependencyKind, BTreeMap<String, DependencySpec>>,
    /// Whether this is the repository root package
    pub is_root: bool,
    /// Whether the package is marked private
    pub private: bool,
}

/// The subset of `package.json` monolog reads
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageJson {
    name: Option<String>,
    version: Option<String>,
    private: Option<bool>,
    dependencies: Option<BTreeMap<String, String>>,
    dev_dependencies: Option<BTreeMap<String, String>>,
    peer_dependencies: Option<BTreeMap<String, String>>,
    optional_dependencies: Option<BTreeMap<String, String>>,
}

impl ManifestNode {
    /// Create a node with no dependencies
    pub fn new(name: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            name: name.into(),
            version: None,
            manifest_path: dir.join("package.json"),
            dir,
            dependencies: BTreeMap::new(),
            is_root: false,
            private: false,
        }
    }

    /// Set the version
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Declare a dependency
    pub fn with_dependency(
        mut self,
        kind: DependencyKind,
        name: impl Into<String>,
        specifier: impl Into<String>,
    ) -> Self {
        self.dependencies
            .entry(kind)
            .or_default()
            .insert(name.into(), DependencySpec::new(specifier));
        self
    }

    /// Mark as the root package
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Parse a `package.json` document located at `manifest_path`
    pub fn parse(manifest_path: &Path, content: &str) -> Result<Self> {
        let pkg: PackageJson = serde_json::from_str(content)?;

        let name = pkg
            .name
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| GraphError::InvalidManifest {
                path: manifest_path.to_path_buf(),
                reason: "missing package name".to_string(),
            })?;

        let dir = manifest_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf();

        let mut dependencies = BTreeMap::new();
        for (kind, section) in [
            (DependencyKind::Prod, pkg.dependencies),
            (DependencyKind::Dev, pkg.dev_dependencies),
            (DependencyKind::Peer, pkg.peer_dependencies),
            (DependencyKind::Optional, pkg.optional_dependencies),
        ] {
            if let Some(section) = section {
                let specs = section
                    .into_iter()
                    .map(|(dep, spec)| (dep, DependencySpec::new(spec)))
                    .collect();
                dependencies.insert(kind, specs);
            }
        }

        Ok(Self {
            name,
            version: pkg.version,
            dir,
            manifest_path: manifest_path.to_path_buf(),
            dependencies,
            is_root: false,
            private: pkg.private.unwrap_or(false),
        })
    }

    /// Iterate every declared dependency as `(kind, name, spec)`
    pub fn declared(&self) -> impl Iterator<Item = (DependencyKind, &str, &DependencySpec)> {
        self.dependencies.iter().flat_map(|(kind, section)| {
            section
                .iter()
                .map(move |(name, spec)| (*kind, name.as_str(), spec))
        })
    }
}
