//! Intent analysis inputs and model selection.
//!
//! The analysis itself comes from outside (an upstream classifier decides
//! what a message needs); this module only defines its shape and the pure
//! model-selection rule.

use serde::{Deserialize, Serialize};

/// Whether a message needs a live web search, and for what.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchIntent {
    /// Whether a search should run.
    pub needed: bool,
    /// The query to send, supplied by the analyzer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SearchIntent {
    /// A search intent with a query.
    pub fn needed(query: impl Into<String>) -> Self {
        Self {
            needed: true,
            query: Some(query.into()),
        }
    }

    /// The query to run, or `None` when no usable search was requested.
    pub fn effective_query(&self) -> Option<&str> {
        if !self.needed {
            return None;
        }
        self.query.as_deref().filter(|q| !q.trim().is_empty())
    }
}

/// Whether a message needs stored facts, optionally narrowed by terms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryIntent {
    /// Whether stored facts should be loaded.
    pub needed: bool,
    /// Terms to filter by; `None` loads the full collection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub terms: Option<Vec<String>>,
}

impl MemoryIntent {
    /// Load the full collection.
    pub fn full() -> Self {
        Self {
            needed: true,
            terms: None,
        }
    }

    /// Load facts matching the given terms.
    pub fn with_terms(terms: Vec<String>) -> Self {
        Self {
            needed: true,
            terms: Some(terms),
        }
    }
}

/// What an incoming message needs, as decided upstream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentAnalysis {
    /// Web search sub-task.
    #[serde(default)]
    pub web_search: SearchIntent,
    /// Memory retrieval sub-task.
    #[serde(default)]
    pub memory_retrieval: MemoryIntent,
    /// Whether the user asked for a generated image.
    #[serde(default)]
    pub image_generation: bool,
}

/// The model identifiers the orchestrator selects between.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Model for ordinary chat turns.
    pub main: String,
    /// Model for image generation turns.
    pub image: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            main: "gemini-2.0-flash".to_string(),
            image: "gemini-2.0-flash-preview-image-generation".to_string(),
        }
    }
}

/// Pick the model for a turn. Image generation wins; everything else uses
/// the main model.
pub fn select_model<'a>(analysis: &IntentAnalysis, models: &'a ModelConfig) -> &'a str {
    if analysis.image_generation {
        &models.image
    } else {
        &models.main
    }
}
