//! Default configuration values

use super::types::Config;

/// Default configuration file name (TOML)
pub const DEFAULT_CONFIG_TOML: &str = "monolog.toml";

/// Default configuration file name (YAML)
pub const DEFAULT_CONFIG_YAML: &str = "monolog.yaml";

/// Conventional commit header grammar
pub const DEFAULT_HEADER_PATTERN: &str =
    r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<title>.+)$";

/// Breaking change trailer grammar
pub const DEFAULT_BODY_PATTERN: &str = r"(?m)^BREAKING[ -]CHANGE: (?P<title>.+)$";

/// Default tag naming template
pub const DEFAULT_TAG_TEMPLATE: &str = "{name}@{version}";

/// Get list of config file names to search for
pub fn config_file_names() -> Vec<&'static str> {
    vec![
        DEFAULT_CONFIG_TOML,
        DEFAULT_CONFIG_YAML,
        ".monolog.toml",
        ".monolog.yaml",
    ]
}

/// Generate default configuration TOML
pub fn default_config_toml() -> String {
    toml::to_string_pretty(&Config::default()).unwrap_or_default()
}
