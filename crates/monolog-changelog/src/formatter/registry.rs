//! Formatter registry

use std::sync::Arc;

use super::{ChangelogFormatter, JsonFormatter, MarkdownFormatter};

/// Registry of available changelog formatters
pub struct FormatterRegistry {
    formatters: Vec<Arc<dyn ChangelogFormatter>>,
}

impl FormatterRegistry {
    /// Create a new registry with all built-in formatters
    pub fn new() -> Self {
        Self {
            formatters: vec![Arc::new(MarkdownFormatter::new()), Arc::new(JsonFormatter::new())],
        }
    }

    /// Get formatter by format name or file extension
    pub fn get(&self, format: &str) -> Option<Arc<dyn ChangelogFormatter>> {
        self.formatters
            .iter()
            .find(|f| f.name() == format || f.extension() == format)
            .cloned()
    }

    /// Get all supported format names
    pub fn names(&self) -> Vec<&'static str> {
        self.formatters.iter().map(|f| f.name()).collect()
    }
}

impl Default for FormatterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_by_name_or_extension() {
        let registry = FormatterRegistry::new();
        assert_eq!(registry.get("markdown").unwrap().extension(), "md");
        assert_eq!(registry.get("md").unwrap().name(), "markdown");
        assert!(registry.get("json").is_some());
        assert!(registry.get("html").is_none());
    }

    #[test]
    fn test_names() {
        assert_eq!(FormatterRegistry::new().names(), vec!["markdown", "json"]);
    }
}
