//! Web search backend trait and result types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ArcherResult;

/// Credentials for a web search backend.
///
/// Fields left unset fall back to the backend's environment variables. A
/// backend without complete credentials reports itself unavailable instead
/// of erroring.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// API key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Search engine identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine_id: Option<String>,
}

/// One result returned by a web search backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSearchResult {
    /// Result title.
    pub title: String,
    /// Full URL.
    pub link: String,
    /// Short text excerpt.
    pub snippet: String,
    /// Abbreviated display form of the URL (host, usually).
    pub display_link: String,
}

impl WebSearchResult {
    /// Create a new search result.
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
        display_link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            display_link: display_link.into(),
        }
    }
}

/// Trait for web search backends.
#[async_trait]
pub trait SearchBackend: Send + Sync {
    /// Whether the backend is configured and can serve queries.
    fn is_available(&self) -> bool;

    /// Run a search, returning at most `limit` results.
    async fn search(&self, query: &str, limit: usize) -> ArcherResult<Vec<WebSearchResult>>;

    /// Render results as a block for model consumption. Empty results render
    /// as an empty string so callers never emit a header with no body.
    fn format_results_for_ai(&self, results: &[WebSearchResult], query: &str) -> String {
        if results.is_empty() {
            return String::new();
        }
        let mut out = format!("Web search results for \"{query}\":\n");
        for (i, r) in results.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {}\n   {}\n   Source: {}\n",
                i + 1,
                r.title,
                r.snippet,
                r.link
            ));
        }
        out
    }

    /// Render results as user-facing markdown.
    fn format_results_for_user(&self, results: &[WebSearchResult]) -> String {
        if results.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        for (i, r) in results.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "{}. [{}]({})\n   {}\n",
                i + 1,
                r.title,
                r.link,
                r.snippet
            ));
        }
        out
    }
}
