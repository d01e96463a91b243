//! Keyword-trigger dispatch over a frozen registry.

use std::sync::Arc;
use tracing::{debug, warn};

use super::registry::TriggerRegistry;
use super::types::{
    DispatchEntry, DispatchOutcome, DispatchReport, TriggerCategory, TriggerCheck, TriggerContext,
    TriggerOutcome,
};
use crate::error::ArcherResult;

/// Checks messages against the registry and runs matched actions.
///
/// The dispatcher owns no mutable state. It holds the registry behind `Arc`,
/// so it is cheap to clone and safe to share across request handlers.
#[derive(Clone)]
pub struct TriggerDispatcher {
    registry: Arc<TriggerRegistry>,
}

impl TriggerDispatcher {
    /// Create a dispatcher over a frozen registry.
    pub fn new(registry: Arc<TriggerRegistry>) -> Self {
        Self { registry }
    }

    /// The underlying registry.
    pub fn registry(&self) -> &TriggerRegistry {
        &self.registry
    }

    /// Check a message against every registered trigger.
    ///
    /// Returns exactly one entry per trigger, in registration order,
    /// non-matches included.
    pub fn check(&self, message: &str) -> Vec<TriggerCheck> {
        self.registry
            .iter()
            .map(|t| TriggerCheck {
                kind: t.kind.clone(),
                category: t.category,
                matched: t.keywords.matches(message),
                matched_keywords: t.keywords.matched_keywords(message),
            })
            .collect()
    }

    /// Like [`check`](Self::check), restricted to one category.
    pub fn check_category(&self, message: &str, category: TriggerCategory) -> Vec<TriggerCheck> {
        self.check(message)
            .into_iter()
            .filter(|c| c.category == category)
            .collect()
    }

    /// Checks that matched, in registration order.
    pub fn matches(&self, message: &str) -> Vec<TriggerCheck> {
        self.check(message).into_iter().filter(|c| c.matched).collect()
    }

    /// Run one trigger's action.
    ///
    /// An unregistered `kind` or a trigger without an action yields
    /// `Ok(None)` with a warning; these are configuration gaps, not dispatch
    /// failures. An error from the action itself propagates to the caller.
    pub async fn execute(
        &self,
        kind: &str,
        context: &TriggerContext,
    ) -> ArcherResult<Option<TriggerOutcome>> {
        let Some(trigger) = self.registry.get(kind) else {
            warn!(kind, "execute requested for unregistered trigger");
            return Ok(None);
        };
        let Some(action) = &trigger.action else {
            warn!(kind, "trigger has no action attached");
            return Ok(None);
        };
        let outcome = action.run(context).await?;
        debug!(kind, summary = %outcome.summary, "trigger action completed");
        Ok(Some(outcome))
    }

    /// Run the actions of every matched check, sequentially.
    ///
    /// Each action is isolated: a failure becomes a
    /// [`DispatchOutcome::Failed`] entry and the remaining actions still run.
    pub async fn execute_all(
        &self,
        checks: &[TriggerCheck],
        context: &TriggerContext,
    ) -> DispatchReport {
        let mut entries = Vec::new();
        for check in checks.iter().filter(|c| c.matched) {
            let outcome = match self.registry.get(&check.kind) {
                None => {
                    warn!(kind = %check.kind, "matched check refers to unregistered trigger");
                    DispatchOutcome::Skipped {
                        reason: "trigger not registered".to_string(),
                    }
                }
                Some(trigger) => match &trigger.action {
                    None => DispatchOutcome::Skipped {
                        reason: "no action attached".to_string(),
                    },
                    Some(action) => match action.run(context).await {
                        Ok(outcome) => DispatchOutcome::Completed { outcome },
                        Err(err) => {
                            warn!(kind = %check.kind, error = %err, "trigger action failed");
                            DispatchOutcome::Failed {
                                error: err.to_string(),
                            }
                        }
                    },
                },
            };
            entries.push(DispatchEntry {
                kind: check.kind.clone(),
                category: check.category,
                outcome,
            });
        }
        DispatchReport { entries }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArcherError;
    use crate::triggers::matcher::KeywordSet;
    use crate::triggers::types::{KeywordTrigger, TriggerAction};
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoAction;

    #[async_trait]
    impl TriggerAction for EchoAction {
        async fn run(&self, context: &TriggerContext) -> ArcherResult<TriggerOutcome> {
            Ok(TriggerOutcome::new("echoed")
                .with_payload(json!({ "message": context.message })))
        }
    }

    struct FailAction;

    #[async_trait]
    impl TriggerAction for FailAction {
        async fn run(&self, _context: &TriggerContext) -> ArcherResult<TriggerOutcome> {
            Err(ArcherError::action("backend unavailable"))
        }
    }

    fn dispatcher() -> TriggerDispatcher {
        let registry = TriggerRegistry::builder()
            .register(
                KeywordTrigger::new(
                    "intention.web_search",
                    TriggerCategory::Intention,
                    KeywordSet::english_only(vec!["search".to_string()]),
                )
                .with_action(Arc::new(EchoAction)),
            )
            .register(
                KeywordTrigger::new(
                    "intention.image_gen",
                    TriggerCategory::Intention,
                    KeywordSet::english_only(vec!["draw".to_string()]),
                )
                .with_action(Arc::new(FailAction)),
            )
            .register(KeywordTrigger::new(
                "memory.general",
                TriggerCategory::Memory,
                KeywordSet::english_only(vec!["remember".to_string()]),
            ))
            .build();
        TriggerDispatcher::new(Arc::new(registry))
    }

    #[test]
    fn test_check_covers_every_trigger() {
        let d = dispatcher();
        let checks = d.check("please search and remember this");

        assert_eq!(checks.len(), 3);
        let kinds: Vec<&str> = checks.iter().map(|c| c.kind.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["intention.web_search", "intention.image_gen", "memory.general"]
        );
        assert!(checks[0].matched);
        assert!(!checks[1].matched);
        assert!(checks[2].matched);
        assert_eq!(checks[0].matched_keywords, vec!["search"]);
        assert!(checks[1].matched_keywords.is_empty());
    }

    #[test]
    fn test_check_category_filters() {
        let d = dispatcher();
        let memory = d.check_category("remember me", TriggerCategory::Memory);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory[0].kind, "memory.general");
    }

    #[tokio::test]
    async fn test_execute_runs_action_with_original_message() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "Search for red pandas");

        let outcome = d.execute("intention.web_search", &ctx).await.unwrap();
        let outcome = outcome.unwrap();
        assert_eq!(outcome.summary, "echoed");
        assert_eq!(
            outcome.payload.unwrap()["message"],
            "Search for red pandas"
        );
    }

    #[tokio::test]
    async fn test_execute_unregistered_is_none_not_error() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "anything");
        let outcome = d.execute("intention.unknown", &ctx).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_execute_actionless_is_none_not_error() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "remember this");
        let outcome = d.execute("memory.general", &ctx).await.unwrap();
        assert!(outcome.is_none());
    }

    #[tokio::test]
    async fn test_execute_propagates_action_error() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "draw a cat");
        let err = d.execute("intention.image_gen", &ctx).await.unwrap_err();
        assert!(err.to_string().contains("backend unavailable"));
    }

    #[tokio::test]
    async fn test_execute_all_isolates_failures() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "search, draw, remember");
        let checks = d.check("search, draw, remember");
        assert!(checks.iter().all(|c| c.matched));

        let report = d.execute_all(&checks, &ctx).await;

        assert_eq!(report.entries.len(), 3);
        assert!(matches!(
            report.entries[0].outcome,
            DispatchOutcome::Completed { .. }
        ));
        assert!(matches!(
            report.entries[1].outcome,
            DispatchOutcome::Failed { .. }
        ));
        assert!(matches!(
            report.entries[2].outcome,
            DispatchOutcome::Skipped { .. }
        ));
        assert!(!report.is_all_completed());
    }

    #[tokio::test]
    async fn test_execute_all_runs_only_matches() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "just search please");
        let checks = d.check("just search please");

        let report = d.execute_all(&checks, &ctx).await;

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].kind, "intention.web_search");
        assert!(report.is_all_completed());
    }

    #[tokio::test]
    async fn test_execute_all_empty_checks() {
        let d = dispatcher();
        let ctx = TriggerContext::new("user1", "nothing");
        let report = d.execute_all(&[], &ctx).await;
        assert!(report.entries.is_empty());
        assert!(report.is_all_completed());
    }
}
