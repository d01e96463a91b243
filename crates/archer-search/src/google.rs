//! Google Custom Search backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use archer_core::error::{ArcherError, ArcherResult};
use archer_core::traits::{SearchBackend, SearchConfig, WebSearchResult};

const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// Results per request the API allows at most.
const MAX_RESULTS_PER_QUERY: usize = 10;

/// Web search via the Google Custom Search JSON API.
///
/// Needs an API key and a programmable search engine id. Without both the
/// backend reports itself unavailable and the orchestrator skips it; missing
/// credentials are a deployment state, not an error.
pub struct GoogleSearch {
    client: Client,
    api_key: Option<String>,
    engine_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchResponse {
    #[serde(default)]
    items: Vec<GoogleSearchItem>,
}

#[derive(Debug, Deserialize)]
struct GoogleSearchItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(rename = "displayLink", default)]
    display_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleError {
    error: GoogleErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorDetail {
    message: String,
}

impl GoogleSearch {
    /// Create a new Google search backend.
    ///
    /// Credentials come from the config, falling back to the
    /// `GOOGLE_SEARCH_API_KEY` and `GOOGLE_SEARCH_ENGINE_ID` environment
    /// variables.
    pub fn new(config: SearchConfig) -> ArcherResult<Self> {
        let api_key = config
            .api_key
            .or_else(|| std::env::var("GOOGLE_SEARCH_API_KEY").ok());
        let engine_id = config
            .engine_id
            .or_else(|| std::env::var("GOOGLE_SEARCH_ENGINE_ID").ok());

        let client = Client::builder().build().map_err(|e| {
            ArcherError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            client,
            api_key,
            engine_id,
        })
    }

    /// Create a backend from environment variables only.
    pub fn from_env() -> ArcherResult<Self> {
        Self::new(SearchConfig::default())
    }

    fn convert(items: Vec<GoogleSearchItem>) -> Vec<WebSearchResult> {
        items
            .into_iter()
            .map(|item| {
                let display_link = item
                    .display_link
                    .unwrap_or_else(|| host_of(&item.link).to_string());
                WebSearchResult {
                    title: item.title,
                    link: item.link,
                    snippet: item.snippet.unwrap_or_default(),
                    display_link,
                }
            })
            .collect()
    }
}

/// Host portion of a URL, for results missing a display link.
fn host_of(link: &str) -> &str {
    let rest = link
        .strip_prefix("https://")
        .or_else(|| link.strip_prefix("http://"))
        .unwrap_or(link);
    rest.split('/').next().unwrap_or(rest)
}

#[async_trait]
impl SearchBackend for GoogleSearch {
    fn is_available(&self) -> bool {
        self.api_key.is_some() && self.engine_id.is_some()
    }

    async fn search(&self, query: &str, limit: usize) -> ArcherResult<Vec<WebSearchResult>> {
        let (Some(api_key), Some(engine_id)) = (&self.api_key, &self.engine_id) else {
            return Err(ArcherError::Configuration(
                "Google search not configured. Set GOOGLE_SEARCH_API_KEY and GOOGLE_SEARCH_ENGINE_ID or provide them in config.".to_string(),
            ));
        };

        let num = limit.clamp(1, MAX_RESULTS_PER_QUERY).to_string();
        let response = self
            .client
            .get(GOOGLE_SEARCH_URL)
            .query(&[
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ArcherError::network(format!("Google search request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ArcherError::network(format!("Failed to read response body: {}", e)))?;

        if !status.is_success() {
            let error: Result<GoogleError, _> = serde_json::from_str(&body);
            let message = error
                .map(|e| e.error.message)
                .unwrap_or_else(|_| body.clone());
            return Err(ArcherError::network(format!(
                "Google search error ({}): {}",
                status, message
            )));
        }

        let response: GoogleSearchResponse = serde_json::from_str(&body)
            .map_err(|e| ArcherError::parse(format!("Failed to parse search response: {}", e)))?;

        let results = Self::convert(response.items);
        debug!(query, count = results.len(), "google search completed");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unconfigured() -> GoogleSearch {
        GoogleSearch {
            client: Client::new(),
            api_key: None,
            engine_id: None,
        }
    }

    fn configured() -> GoogleSearch {
        GoogleSearch {
            client: Client::new(),
            api_key: Some("key".to_string()),
            engine_id: Some("cx".to_string()),
        }
    }

    #[test]
    fn test_availability_requires_both_credentials() {
        assert!(!unconfigured().is_available());
        assert!(configured().is_available());

        let key_only = GoogleSearch {
            client: Client::new(),
            api_key: Some("key".to_string()),
            engine_id: None,
        };
        assert!(!key_only.is_available());
    }

    #[test]
    fn test_search_without_credentials_is_configuration_error() {
        let err = tokio_test::block_on(unconfigured().search("anything", 5)).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }

    #[test]
    fn test_response_parsing_and_conversion() {
        let body = r#"{
            "items": [
                {
                    "title": "Osaka Castle",
                    "link": "https://en.wikipedia.org/wiki/Osaka_Castle",
                    "snippet": "A Japanese castle in Osaka.",
                    "displayLink": "en.wikipedia.org"
                },
                {
                    "title": "No snippet result",
                    "link": "http://example.com/page"
                }
            ]
        }"#;
        let parsed: GoogleSearchResponse = serde_json::from_str(body).unwrap();
        let results = GoogleSearch::convert(parsed.items);

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Osaka Castle");
        assert_eq!(results[0].display_link, "en.wikipedia.org");
        assert_eq!(results[1].snippet, "");
        assert_eq!(results[1].display_link, "example.com");
    }

    #[test]
    fn test_empty_response_has_no_items() {
        let parsed: GoogleSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn test_formatting_via_trait_defaults() {
        let backend = configured();
        let results = vec![WebSearchResult::new(
            "Title",
            "https://example.com",
            "Snippet.",
            "example.com",
        )];
        let block = backend.format_results_for_ai(&results, "query");
        assert!(block.starts_with("Web search results for \"query\":"));
        assert!(block.contains("1. Title"));
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://example.com/a/b"), "example.com");
        assert_eq!(host_of("http://sub.example.org"), "sub.example.org");
        assert_eq!(host_of("example.net/path"), "example.net");
    }
}
