//! Version command

use clap::Args;
use console::style;
use serde::Serialize;
use tracing::info;

use monolog_core::BumpSeverity;

use super::{load_workspace, select_packages};
use crate::cli::{output, Cli, OutputFormat};

/// Show current version, bump and next version per package
#[derive(Debug, Args)]
pub struct VersionCommand {
    /// Package name
    #[arg(short, long)]
    pub package: Option<String>,

    /// Only list packages that need a release
    #[arg(long)]
    pub changed: bool,
}

#[derive(Serialize)]
struct VersionInfo<'a> {
    name: &'a str,
    current_version: Option<&'a str>,
    bump: BumpSeverity,
    next_version: Option<&'a str>,
}

impl VersionCommand {
    /// Execute the version command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(package = ?self.package, changed = self.changed, "executing version command");
        let (planner, workspace) = load_workspace(cli)?;
        let plan = planner.plan(&workspace)?;

        let reports: Vec<_> = select_packages(plan.packages, self.package.as_deref())?
            .into_iter()
            .filter(|r| !self.changed || r.needs_release())
            .collect();

        match cli.format {
            OutputFormat::Json => {
                let infos: Vec<VersionInfo<'_>> = reports
                    .iter()
                    .map(|r| VersionInfo {
                        name: &r.name,
                        current_version: r.current_version.as_deref(),
                        bump: r.bump,
                        next_version: r.next_version.as_deref(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&infos)?);
            }
            OutputFormat::Text => {
                if cli.quiet {
                    return Ok(());
                }
                if reports.is_empty() {
                    output::info("No packages need a release.");
                    return Ok(());
                }

                for report in &reports {
                    let current = report.current_version.as_deref().unwrap_or("-");
                    match &report.next_version {
                        Some(next) => println!(
                            "{} {} → {} ({})",
                            output::header(&report.name),
                            current,
                            output::version_style().apply_to(next),
                            output::bump_style(report.bump).apply_to(report.bump)
                        ),
                        None if report.bump.is_release() => println!(
                            "{} {} ({}, no base version)",
                            output::header(&report.name),
                            current,
                            output::bump_style(report.bump).apply_to(report.bump)
                        ),
                        None => println!(
                            "{} {} {}",
                            output::header(&report.name),
                            current,
                            style("(unchanged)").dim()
                        ),
                    }
                }
            }
        }

        Ok(())
    }
}
