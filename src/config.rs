//! Panel configuration.
//!
//! Every field has a default, so an empty JSON object (or no file at all)
//! gives the stock Stack Overflow setup:
//!
//! ```json
//! {
//!   "heading": "StackOverflow post similar to these errors",
//!   "search": {
//!     "endpoint": "https://api.stackexchange.com/2.2/search/advanced",
//!     "site": "stackoverflow",
//!     "language": "typescript",
//!     "page_size": 10
//!   }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Largest page the panel asks the search API for.
pub const MAX_PAGE_SIZE: u32 = 10;

/// Top-level configuration for a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Heading shown above the panel contents.
    pub heading: String,

    /// How related posts are looked up.
    pub search: SearchConfig,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            heading: "StackOverflow post similar to these errors".to_string(),
            search: SearchConfig::default(),
        }
    }
}

impl PanelConfig {
    /// Load configuration from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read panel config from {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse panel config from {}", path.display()))?;
        tracing::debug!("Loaded panel config from {}", path.display());
        Ok(config)
    }

    /// Load configuration from `path` if given, otherwise use the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

/// Parameters of the related-post search request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Stack Exchange advanced search endpoint.
    pub endpoint: String,

    /// Community to search (`site` parameter).
    pub site: String,

    /// Language name prepended to every query as a topic hint.
    pub language: String,

    /// Sort key; the API orders by it descending.
    pub sort: String,

    /// Only return questions with an accepted answer.
    pub accepted_only: bool,

    /// Results per diagnostic, capped at [`MAX_PAGE_SIZE`].
    pub page_size: u32,

    /// Stack Exchange app key. Raises the request quota when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Request timeout. None waits as long as the transport does.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.stackexchange.com/2.2/search/advanced".to_string(),
            site: "stackoverflow".to_string(),
            language: "typescript".to_string(),
            sort: "votes".to_string(),
            accepted_only: true,
            page_size: MAX_PAGE_SIZE,
            api_key: None,
            timeout_secs: None,
        }
    }
}

impl SearchConfig {
    /// Point the search at a different endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// The page size actually requested.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config: PanelConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, PanelConfig::default());
        assert_eq!(config.search.site, "stackoverflow");
        assert_eq!(config.search.effective_page_size(), 10);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config: PanelConfig =
            serde_json::from_str(r#"{"search": {"language": "rust", "page_size": 50}}"#).unwrap();
        assert_eq!(config.search.language, "rust");
        assert_eq!(config.search.sort, "votes");
        assert_eq!(config.search.effective_page_size(), MAX_PAGE_SIZE);
        assert_eq!(config.heading, PanelConfig::default().heading);
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let err = PanelConfig::load(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("Failed to parse panel config"),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = PanelConfig::load_or_default(None).unwrap();
        assert_eq!(config, PanelConfig::default());
    }
}
