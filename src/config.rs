//! Conversion configuration
//!
//! Every conversion receives its configuration explicitly; there is no
//! process-wide default that can be mutated.

use serde::Deserialize;
use std::env;

/// Selector of the host-page element the aggregated content is injected into
pub const DEFAULT_SCOPE_SELECTOR: &str = "#epub-content";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConvertConfig {
    /// Container selector every stylesheet rule is scoped under
    pub scope_selector: String,
    /// Treat any recoverable problem as a fatal error
    pub strict: bool,
    /// Process stylesheets, documents and assets on the rayon pool
    pub parallel: bool,
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            scope_selector: DEFAULT_SCOPE_SELECTOR.to_string(),
            strict: false,
            parallel: true,
        }
    }
}

impl ConvertConfig {
    /// Read overrides from `EPUB_SCOPE_SELECTOR`, `EPUB_STRICT` and `EPUB_PARALLEL`
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            scope_selector: env::var("EPUB_SCOPE_SELECTOR")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.scope_selector),
            strict: env::var("EPUB_STRICT")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.strict),
            parallel: env::var("EPUB_PARALLEL")
                .ok()
                .and_then(|v| parse_flag(&v))
                .unwrap_or(defaults.parallel),
        }
    }

    pub fn with_scope_selector(mut self, selector: impl Into<String>) -> Self {
        self.scope_selector = selector.into();
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConvertConfig::default();
        assert_eq!(config.scope_selector, "#epub-content");
        assert!(!config.strict);
        assert!(config.parallel);
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ConvertConfig = serde_json::from_str(r#"{"strict": true}"#).unwrap();
        assert!(config.strict);
        assert_eq!(config.scope_selector, DEFAULT_SCOPE_SELECTOR);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" off "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    // Only test in the crate that touches these variables
    #[test]
    fn test_from_env_overrides() {
        env::set_var("EPUB_SCOPE_SELECTOR", ".reader");
        env::set_var("EPUB_STRICT", "yes");
        env::set_var("EPUB_PARALLEL", "not-a-flag");
        let config = ConvertConfig::from_env();

        assert_eq!(config.scope_selector, ".reader");
        assert!(config.strict);
        assert!(config.parallel);

        env::set_var("EPUB_SCOPE_SELECTOR", "   ");
        env::remove_var("EPUB_STRICT");
        env::set_var("EPUB_PARALLEL", "0");
        let config = ConvertConfig::from_env();

        assert_eq!(config.scope_selector, DEFAULT_SCOPE_SELECTOR);
        assert!(!config.strict);
        assert!(!config.parallel);

        env::remove_var("EPUB_SCOPE_SELECTOR");
        env::remove_var("EPUB_PARALLEL");
    }
}
