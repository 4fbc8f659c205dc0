//! Configuration validation

use regex::Regex;
use tracing::debug;

use crate::error::{ConfigError, Result};

use super::types::Config;

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    debug!("validating configuration");
    validate_commits(config)?;
    validate_tags(config)?;
    validate_graph(config)?;
    validate_changelog(config)?;
    debug!("configuration validation passed");
    Ok(())
}

fn validate_commits(config: &Config) -> Result<()> {
    if config.commits.header_patterns.is_empty() {
        return Err(invalid(
            "commits.header_patterns",
            "at least one header grammar is required",
        ));
    }

    for (i, pattern) in config.commits.header_patterns.iter().enumerate() {
        let field = format!("commits.header_patterns[{}]", i);
        require_groups(&field, pattern, &["type", "title"])?;
    }

    for (i, pattern) in config.commits.body_patterns.iter().enumerate() {
        let field = format!("commits.body_patterns[{}]", i);
        require_groups(&field, pattern, &["title"])?;
    }

    Ok(())
}

fn validate_tags(config: &Config) -> Result<()> {
    let template = &config.tags.template;
    if template.matches("{name}").count() != 1 || template.matches("{version}").count() != 1 {
        return Err(invalid(
            "tags.template",
            "must contain exactly one {name} and one {version} placeholder",
        ));
    }
    Ok(())
}

fn validate_graph(config: &Config) -> Result<()> {
    if config.graph.manifest.is_empty() {
        return Err(invalid("graph.manifest", "manifest file name cannot be empty"));
    }

    if config.graph.concurrency == 0 {
        return Err(invalid("graph.concurrency", "must be greater than zero"));
    }

    Ok(())
}

fn validate_changelog(config: &Config) -> Result<()> {
    let valid_formats = ["markdown", "md", "json"];
    if !valid_formats.contains(&config.changelog.format.as_str()) {
        return Err(invalid(
            "changelog.format",
            &format!("must be one of: {}", valid_formats.join(", ")),
        ));
    }

    Ok(())
}

/// Compile `pattern` and check it declares every group in `groups`
fn require_groups(field: &str, pattern: &str, groups: &[&str]) -> Result<()> {
    let regex = Regex::new(pattern).map_err(|e| invalid(field, &e.to_string()))?;
    let names: Vec<&str> = regex.capture_names().flatten().collect();

    for group in groups {
        if !names.contains(group) {
            return Err(invalid(
                field,
                &format!("missing named capture group '{}'", group),
            ));
        }
    }

    Ok(())
}

fn invalid(field: &str, message: &str) -> crate::error::MonologError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
    .into()
}
