//! Graph command

use clap::Args;
use serde::Serialize;
use tracing::info;

use monolog_core::monorepo::DependencyGraph;

use super::load_workspace;
use crate::cli::{output, Cli, OutputFormat};

/// Show packages and their dependency edges
#[derive(Debug, Args)]
pub struct GraphCommand {
    /// Only list packages depending, directly or transitively, on this one
    #[arg(long, value_name = "PACKAGE")]
    pub dependants_of: Option<String>,
}

#[derive(Serialize)]
struct GraphNode<'a> {
    name: &'a str,
    version: Option<&'a str>,
    dir: String,
    root: bool,
    dependencies: Vec<String>,
}

#[derive(Serialize)]
struct GraphReport<'a> {
    packages: Vec<GraphNode<'a>>,
    warnings: Vec<String>,
}

impl GraphCommand {
    /// Execute the graph command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(dependants_of = ?self.dependants_of, "executing graph command");
        let (_, workspace) = load_workspace(cli)?;
        let graph = &workspace.graph;

        if let Some(name) = &self.dependants_of {
            let dependants = sorted_dependants(graph, name)?;

            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dependants)?),
                OutputFormat::Text => {
                    for dependant in &dependants {
                        println!("{}", dependant);
                    }
                }
            }
            return Ok(());
        }

        match cli.format {
            OutputFormat::Json => {
                let report = GraphReport {
                    packages: graph
                        .nodes()
                        .map(|node| GraphNode {
                            name: &node.name,
                            version: node.version.as_deref(),
                            dir: node
                                .dir
                                .strip_prefix(&workspace.root)
                                .unwrap_or(&node.dir)
                                .display()
                                .to_string(),
                            root: node.is_root,
                            dependencies: graph.dependencies_of(&node.name).into_iter().collect(),
                        })
                        .collect(),
                    warnings: workspace.warnings.iter().map(|w| w.to_string()).collect(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }

                println!("{}", output::header("Packages"));
                for node in graph.nodes() {
                    let dir = node.dir.strip_prefix(&workspace.root).unwrap_or(&node.dir);
                    println!(
                        "{}",
                        output::key_value(
                            &node.name,
                            &format!(
                                "{} {}",
                                node.version.as_deref().unwrap_or("-"),
                                output::path_style().apply_to(dir.display())
                            )
                        )
                    );
                }

                println!();
                println!("{}", output::header("Dependencies"));
                for (from, to) in graph.edges() {
                    println!("  {} → {}", from, to);
                }
            }
        }

        Ok(())
    }
}

/// Dependants of `name`, sorted; unknown names are a graph error
fn sorted_dependants(graph: &DependencyGraph, name: &str) -> anyhow::Result<Vec<String>> {
    graph.require(name)?;
    let mut dependants: Vec<String> = graph.dependants_of(name).into_iter().collect();
    dependants.sort();
    Ok(dependants)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes::{for_error, GRAPH_ERROR};
    use monolog_core::monorepo::{DependencyKind, EdgeFilter, ManifestNode};

    fn graph() -> DependencyGraph {
        let nodes = vec![
            ManifestNode::new("core", "/repo/packages/core"),
            ManifestNode::new("utils", "/repo/packages/utils")
                .with_dependency(DependencyKind::Prod, "core", "workspace:*"),
            ManifestNode::new("app", "/repo/packages/app")
                .with_dependency(DependencyKind::Prod, "utils", "workspace:*"),
        ];
        DependencyGraph::from_nodes(nodes, &EdgeFilter::all()).unwrap()
    }

    #[test]
    fn test_sorted_dependants() {
        assert_eq!(sorted_dependants(&graph(), "core").unwrap(), vec!["app", "utils"]);
        assert!(sorted_dependants(&graph(), "app").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_dependants_target_is_graph_error() {
        let err = sorted_dependants(&graph(), "missing").unwrap_err();
        assert_eq!(for_error(&err), GRAPH_ERROR);
        assert!(err.to_string().contains("missing"));
    }
}
