//! Tags command

use clap::Args;
use tracing::info;

use super::load_workspace;
use crate::cli::{output, Cli, OutputFormat};

/// List version tags resolved against the configured template
#[derive(Debug, Args)]
pub struct TagsCommand {
    /// Only list tags of this package (`name` or `name@version`)
    #[arg(short, long)]
    pub package: Option<String>,
}

impl TagsCommand {
    /// Execute the tags command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(package = ?self.package, "executing tags command");
        let (planner, workspace) = load_workspace(cli)?;
        let query = self.package.as_deref().map(monolog_git::ProjectQuery::parse);

        let tags: Vec<_> = planner
            .resolve_tags(&workspace.commits)?
            .into_iter()
            .filter(|t| query.as_ref().map_or(true, |q| q.matches(&t.tag)))
            .collect();

        match cli.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&tags)?),
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                if tags.is_empty() {
                    output::info("No version tags found.");
                    return Ok(());
                }
                for position in tags.iter().rev() {
                    println!(
                        "{}  {} {}  {}",
                        output::tag_style().apply_to(&position.tag.raw),
                        position.tag.name,
                        output::version_style().apply_to(&position.tag.version),
                        position.date.format("%Y-%m-%d")
                    );
                }
            }
        }

        Ok(())
    }
}
