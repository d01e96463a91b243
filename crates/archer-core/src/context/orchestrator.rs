//! Builds the per-turn context string from memory and web search.

use futures::future::OptionFuture;
use std::sync::Arc;
use tracing::{debug, warn};

use super::analysis::{select_model, IntentAnalysis, ModelConfig};
use crate::memory::FactStore;
use crate::traits::{SearchBackend, WebSearchResult};
use crate::types::MemoryFact;
use crate::usage::SearchQuota;

/// Header above the remembered-facts block.
pub const MEMORY_HEADER: &str = "What I remember about this user:";
/// Separator appended after each block.
pub const BLOCK_SEPARATOR: &str = "\n---\n\n";

const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Everything the chat pipeline needs for one turn.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OrchestratedContext {
    /// Model identifier selected for this turn.
    pub model: String,
    /// Assembled context string; empty when nothing was gathered.
    pub context: String,
    /// Facts surfaced into the context; `None` when the sub-task did not run
    /// or failed.
    pub memory_facts: Option<Vec<MemoryFact>>,
    /// Web results surfaced into the context; `None` when the sub-task did
    /// not run or failed, `Some` but empty when the backend had nothing.
    pub web_results: Option<Vec<WebSearchResult>>,
    /// Denial message from the quota; the only failure surfaced structurally.
    pub rate_limit_error: Option<String>,
}

enum WebOutcome {
    Results(Vec<WebSearchResult>),
    RateLimited(String),
    Failed,
}

/// Fans out the needed sub-tasks for a turn and assembles their output.
///
/// Sub-task failures degrade to an absent block; the caller always gets a
/// usable (possibly empty) context. Only a quota denial is surfaced
/// structurally, so the UI can tell the user why search is off.
#[derive(Clone)]
pub struct ContextOrchestrator {
    search: Arc<dyn SearchBackend>,
    facts: Arc<dyn FactStore>,
    quota: SearchQuota,
    models: ModelConfig,
    search_limit: usize,
}

impl ContextOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        search: Arc<dyn SearchBackend>,
        facts: Arc<dyn FactStore>,
        quota: SearchQuota,
        models: ModelConfig,
    ) -> Self {
        Self {
            search,
            facts,
            quota,
            models,
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Cap the number of web results per search.
    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    /// Run the needed sub-tasks concurrently and assemble the context.
    ///
    /// Un-needed sub-tasks are not launched at all. Launched sub-tasks settle
    /// independently; one failing never stops the other.
    pub async fn build_context(
        &self,
        user_id: &str,
        conversation_id: Option<&str>,
        analysis: &IntentAnalysis,
    ) -> OrchestratedContext {
        debug!(user_id, conversation_id, "building turn context");

        let web_task: OptionFuture<_> = analysis
            .web_search
            .effective_query()
            .map(|query| self.run_web_search(user_id, query))
            .into();
        let memory_task: OptionFuture<_> = analysis
            .memory_retrieval
            .needed
            .then(|| self.run_memory(user_id, analysis.memory_retrieval.terms.as_deref()))
            .into();

        let (web, memory) = tokio::join!(web_task, memory_task);

        let mut rate_limit_error = None;
        let web_results = match web {
            Some(WebOutcome::Results(results)) => Some(results),
            Some(WebOutcome::RateLimited(message)) => {
                rate_limit_error = Some(message);
                None
            }
            Some(WebOutcome::Failed) | None => None,
        };
        let memory_facts = memory.flatten();

        let query = analysis.web_search.effective_query().unwrap_or_default();
        let context = self.assemble(memory_facts.as_deref(), web_results.as_deref(), query);

        OrchestratedContext {
            model: select_model(analysis, &self.models).to_string(),
            context,
            memory_facts,
            web_results,
            rate_limit_error,
        }
    }

    async fn run_web_search(&self, user_id: &str, query: &str) -> WebOutcome {
        let decision = self.quota.check().await;
        if !decision.allowed {
            let message = decision
                .message
                .unwrap_or_else(|| "Daily web search limit reached.".to_string());
            debug!(user_id, "search denied by quota");
            return WebOutcome::RateLimited(message);
        }

        if !self.search.is_available() {
            debug!("search backend not configured, skipping");
            return WebOutcome::Results(Vec::new());
        }

        match self.search.search(query, self.search_limit).await {
            Ok(results) => {
                if let Err(err) = self.quota.track(user_id, query, results.len()).await {
                    warn!(error = %err, "failed to record search usage");
                }
                WebOutcome::Results(results)
            }
            Err(err) => {
                warn!(error = %err, query, "web search failed");
                WebOutcome::Failed
            }
        }
    }

    async fn run_memory(
        &self,
        user_id: &str,
        terms: Option<&[String]>,
    ) -> Option<Vec<MemoryFact>> {
        let memory = match self.facts.get(user_id).await {
            Ok(memory) => memory,
            Err(err) => {
                warn!(error = %err, user_id, "memory load failed");
                return None;
            }
        };

        let surfaced = match terms {
            Some(terms) => memory.retrieve(terms),
            None => memory.facts,
        };

        if !surfaced.is_empty() {
            let ids: Vec<String> = surfaced.iter().map(|f| f.id.clone()).collect();
            if let Err(err) = self.facts.record_use(user_id, &ids).await {
                warn!(error = %err, user_id, "failed to record fact usage");
            }
        }
        Some(surfaced)
    }

    /// Deterministic concatenation: memory block first, then search block,
    /// each followed by the separator. Empty sub-results contribute nothing.
    fn assemble(
        &self,
        facts: Option<&[MemoryFact]>,
        results: Option<&[WebSearchResult]>,
        query: &str,
    ) -> String {
        let mut context = String::new();

        if let Some(facts) = facts.filter(|f| !f.is_empty()) {
            context.push_str(MEMORY_HEADER);
            context.push('\n');
            for fact in facts {
                context.push_str("- ");
                context.push_str(&fact.content);
                context.push('\n');
            }
            context.push_str(BLOCK_SEPARATOR);
        }

        if let Some(results) = results.filter(|r| !r.is_empty()) {
            context.push_str(&self.search.format_results_for_ai(results, query));
            context.push_str(BLOCK_SEPARATOR);
        }

        context
    }
}
