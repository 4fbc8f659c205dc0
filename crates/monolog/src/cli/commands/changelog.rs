//! Changelog command

use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::{debug, info};

use monolog_changelog::{ChangelogGenerator, PackageReport, VersionGroup};

use super::{load_workspace, select_packages};
use crate::cli::{output, Cli, OutputFormat};

/// Heading written at the top of new markdown changelogs
const CHANGELOG_HEADER: &str = "# Changelog\n\n";

/// Generate changelogs per package
#[derive(Debug, Args)]
pub struct ChangelogCommand {
    /// Package name
    #[arg(short, long)]
    pub package: Option<String>,

    /// Write to each package's changelog file (default: print to stdout)
    #[arg(short, long)]
    pub write: bool,

    /// Output file, only valid together with a single package
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct PackageChangelog<'a> {
    package: &'a str,
    groups: &'a [VersionGroup],
}

impl ChangelogCommand {
    /// Execute the changelog command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(package = ?self.package, write = self.write, "executing changelog command");
        let (planner, workspace) = load_workspace(cli)?;
        let plan = planner.plan(&workspace)?;
        let reports = select_packages(plan.packages, self.package.as_deref())?;

        if self.output.is_some() && reports.len() != 1 {
            anyhow::bail!("--output needs exactly one package; use --package");
        }

        let generator = planner.generator()?;

        if self.write {
            for report in &reports {
                let target = match &self.output {
                    Some(path) => path.clone(),
                    None => {
                        let node = workspace.graph.get(&report.name).ok_or_else(|| {
                            anyhow::anyhow!("package '{}' left the graph", report.name)
                        })?;
                        node.dir.join(&planner.config().changelog.file)
                    }
                };
                if self.write_package(report, &generator, &target)? && !cli.quiet {
                    output::success(&format!(
                        "Changelog for {} written to {}",
                        report.name,
                        output::path_style().apply_to(target.display())
                    ));
                }
            }
            return Ok(());
        }

        // All console output goes through one locked writer.
        let stdout = std::io::stdout();
        let mut out = stdout.lock();

        match cli.format {
            OutputFormat::Json => {
                let changelogs: Vec<PackageChangelog<'_>> = reports
                    .iter()
                    .map(|r| PackageChangelog {
                        package: &r.name,
                        groups: &r.groups,
                    })
                    .collect();
                writeln!(out, "{}", serde_json::to_string_pretty(&changelogs)?)?;
            }
            OutputFormat::Text => {
                for report in reports.iter().filter(|r| !r.groups.is_empty()) {
                    writeln!(out, "# {}\n", report.name)?;
                    write!(out, "{}", generator.format(&report.groups))?;
                }
            }
        }

        Ok(())
    }

    /// Write new versions of one package to `target`; returns whether
    /// anything was written
    fn write_package(
        &self,
        report: &PackageReport,
        generator: &ChangelogGenerator,
        target: &Path,
    ) -> anyhow::Result<bool> {
        let existing = match std::fs::read_to_string(target) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };

        let groups = groups_to_write(report, existing.as_deref());
        if groups.is_empty() {
            debug!(package = %report.name, "changelog already up to date");
            return Ok(false);
        }

        let entry = generator.format(&groups);
        let content = if is_markdown(target) {
            prepend(existing.as_deref(), &entry)
        } else {
            entry
        };

        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(target, content)?;
        Ok(true)
    }
}

/// Groups missing from an existing changelog; the unreleased group is
/// published under the planned next version
fn groups_to_write(report: &PackageReport, existing: Option<&str>) -> Vec<VersionGroup> {
    report
        .groups
        .iter()
        .filter_map(|group| {
            if !group.is_unreleased() {
                return Some(group.clone());
            }
            let next = report.next_version.as_ref()?;
            let mut group = group.clone();
            group.version = next.clone();
            group.date = Some(Utc::now());
            Some(group)
        })
        .filter(|group| {
            existing.map_or(true, |text| !text.contains(&format!("## [{}]", group.version)))
        })
        .collect()
}

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md") | Some("markdown")
    )
}

/// Insert `entry` below the changelog header, creating the header if needed
fn prepend(existing: Option<&str>, entry: &str) -> String {
    match existing {
        Some(existing) => match existing.strip_prefix(CHANGELOG_HEADER) {
            Some(rest) => format!("{}{}{}", CHANGELOG_HEADER, entry, rest),
            None => format!("{}{}", entry, existing),
        },
        None => format!("{}{}", CHANGELOG_HEADER, entry),
    }
}
