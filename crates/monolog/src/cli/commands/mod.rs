//! CLI commands

mod changelog;
mod graph;
mod tags;
mod version;

pub use changelog::ChangelogCommand;
pub use graph::GraphCommand;
pub use tags::TagsCommand;
pub use version::VersionCommand;

use tracing::debug;

use monolog_changelog::{PackageReport, ReleasePlanner, Workspace};
use monolog_core::config::load_config_or_default;
use monolog_core::error::{GraphError, MonologError};
use monolog_git::ProjectQuery;

use crate::cli::{output, Cli};

/// Load configuration, dependency graph and history for the current directory
fn load_workspace(cli: &Cli) -> anyhow::Result<(ReleasePlanner, Workspace)> {
    let cwd = std::env::current_dir()?;
    let (config, config_path) = load_config_or_default(&cwd)?;
    debug!(config = ?config_path, "configuration loaded");

    let planner = ReleasePlanner::new(config);
    let runtime = tokio::runtime::Runtime::new()?;
    let workspace = runtime.block_on(planner.load(&cwd))?;

    if !cli.quiet {
        for warning in &workspace.warnings {
            output::warning(&warning.to_string());
        }
    }

    Ok((planner, workspace))
}

/// Keep only the reports matching `--package`, if given
fn select_packages(
    reports: Vec<PackageReport>,
    package: Option<&str>,
) -> anyhow::Result<Vec<PackageReport>> {
    let Some(package) = package else {
        return Ok(reports);
    };

    let query = ProjectQuery::parse(package);
    let selected: Vec<PackageReport> = reports
        .into_iter()
        .filter(|r| r.name == query.name)
        .collect();

    if selected.is_empty() {
        return Err(MonologError::from(GraphError::UnknownPackage(query.name)).into());
    }
    Ok(selected)
}
