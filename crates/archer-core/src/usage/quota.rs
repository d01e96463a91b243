//! Daily search quota over the usage log.

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::store::UsageStore;
use crate::error::ArcherResult;
use crate::types::SearchUsage;

/// Quota thresholds and pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Searches allowed per sliding 24h window, across all users.
    pub daily_limit: u64,
    /// Searches per window that cost nothing.
    pub free_daily: u64,
    /// Cost in USD per search beyond the free allowance.
    pub cost_per_query: f64,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            daily_limit: 100,
            free_daily: 100,
            cost_per_query: 0.005,
        }
    }
}

/// Outcome of a quota check. Denial is data, not an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuotaDecision {
    /// Whether a search may run now.
    pub allowed: bool,
    /// Searches left in the current window.
    pub daily_remaining: u64,
    /// Human-readable denial message; `None` when allowed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Global daily search limiter.
///
/// Counts usage records in the last 24 hours against a fixed threshold. The
/// window is shared by all users because the limit protects the search API
/// key, not individual accounts.
#[derive(Clone)]
pub struct SearchQuota {
    store: Arc<dyn UsageStore>,
    config: QuotaConfig,
}

impl SearchQuota {
    /// Create a limiter over a usage log.
    pub fn new(store: Arc<dyn UsageStore>, config: QuotaConfig) -> Self {
        Self { store, config }
    }

    /// The configured thresholds.
    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Decide whether a search may run now.
    ///
    /// Fails open: if the count query errors, the search is allowed and the
    /// failure is logged. `daily_remaining` then reports the full limit since
    /// the true count is unknown.
    pub async fn check(&self) -> QuotaDecision {
        let since = Utc::now() - Duration::hours(24);
        match self.store.count_since(since).await {
            Ok(count) if count >= self.config.daily_limit => {
                debug!(count, limit = self.config.daily_limit, "search quota exhausted");
                QuotaDecision {
                    allowed: false,
                    daily_remaining: 0,
                    message: Some(format!(
                        "Daily web search limit of {} reached. Searches resume as older usage ages out.",
                        self.config.daily_limit
                    )),
                }
            }
            Ok(count) => QuotaDecision {
                allowed: true,
                daily_remaining: self.config.daily_limit - count,
                message: None,
            },
            Err(err) => {
                warn!(error = %err, "usage count failed, allowing search");
                QuotaDecision {
                    allowed: true,
                    daily_remaining: self.config.daily_limit,
                    message: None,
                }
            }
        }
    }

    /// Cost of the next search given how many already ran in the window.
    pub fn cost_for(&self, prior_count: u64) -> f64 {
        if prior_count < self.config.free_daily {
            0.0
        } else {
            self.config.cost_per_query
        }
    }

    /// Append a usage record for a search that just ran.
    ///
    /// The record's cost is derived from the current window count. A failing
    /// count query is treated as zero prior searches (free tier) so tracking
    /// still succeeds; a failing append propagates to the caller.
    pub async fn track(
        &self,
        user_id: &str,
        query: &str,
        result_count: usize,
    ) -> ArcherResult<SearchUsage> {
        let since = Utc::now() - Duration::hours(24);
        let prior = match self.store.count_since(since).await {
            Ok(count) => count,
            Err(err) => {
                warn!(error = %err, "usage count failed while tracking, assuming free tier");
                0
            }
        };
        let usage =
            SearchUsage::new(user_id, query, result_count).with_cost(self.cost_for(prior));
        self.store.append(&usage).await?;
        Ok(usage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ArcherError;
    use crate::usage::store::SqliteUsageStore;
    use async_trait::async_trait;
    use chrono::DateTime;

    struct FailingStore;

    #[async_trait]
    impl UsageStore for FailingStore {
        async fn append(&self, _usage: &SearchUsage) -> ArcherResult<()> {
            Err(ArcherError::database("disk on fire"))
        }

        async fn count_since(&self, _since: DateTime<Utc>) -> ArcherResult<u64> {
            Err(ArcherError::database("disk on fire"))
        }

        async fn recent(&self, _limit: usize) -> ArcherResult<Vec<SearchUsage>> {
            Err(ArcherError::database("disk on fire"))
        }
    }

    async fn quota_with_records(n: usize) -> SearchQuota {
        let store = SqliteUsageStore::in_memory().unwrap();
        for i in 0..n {
            let usage = SearchUsage::new("user1", format!("query {i}"), 1);
            store.append(&usage).await.unwrap();
        }
        SearchQuota::new(Arc::new(store), QuotaConfig::default())
    }

    #[tokio::test]
    async fn test_quota_boundary() {
        let quota = quota_with_records(99).await;
        let decision = quota.check().await;
        assert!(decision.allowed);
        assert_eq!(decision.daily_remaining, 1);
        assert!(decision.message.is_none());

        let quota = quota_with_records(100).await;
        let decision = quota.check().await;
        assert!(!decision.allowed);
        assert_eq!(decision.daily_remaining, 0);
        assert!(decision.message.unwrap().contains("limit of 100"));
    }

    #[tokio::test]
    async fn test_records_outside_window_ignored() {
        let store = SqliteUsageStore::in_memory().unwrap();
        for _ in 0..100 {
            let mut usage = SearchUsage::new("user1", "stale", 1);
            usage.timestamp = Utc::now() - Duration::hours(25);
            store.append(&usage).await.unwrap();
        }
        let quota = SearchQuota::new(Arc::new(store), QuotaConfig::default());

        let decision = quota.check().await;
        assert!(decision.allowed);
        assert_eq!(decision.daily_remaining, 100);
    }

    // A broken usage store must never block chat turns.
    #[tokio::test]
    async fn test_fail_open_on_count_error() {
        let quota = SearchQuota::new(Arc::new(FailingStore), QuotaConfig::default());
        let decision = quota.check().await;
        assert!(decision.allowed);
        assert_eq!(decision.daily_remaining, 100);
    }

    #[tokio::test]
    async fn test_track_free_then_paid() {
        let store = Arc::new(SqliteUsageStore::in_memory().unwrap());
        let config = QuotaConfig {
            daily_limit: 10,
            free_daily: 2,
            cost_per_query: 0.005,
        };
        let quota = SearchQuota::new(store, config);

        let first = quota.track("user1", "q1", 3).await.unwrap();
        let second = quota.track("user1", "q2", 3).await.unwrap();
        let third = quota.track("user1", "q3", 3).await.unwrap();

        assert_eq!(first.estimated_cost, 0.0);
        assert_eq!(second.estimated_cost, 0.0);
        assert_eq!(third.estimated_cost, 0.005);
    }

    #[tokio::test]
    async fn test_track_append_failure_propagates() {
        let quota = SearchQuota::new(Arc::new(FailingStore), QuotaConfig::default());
        assert!(quota.track("user1", "q", 1).await.is_err());
    }

    #[test]
    fn test_cost_split_has_no_volume_tiers() {
        let quota = SearchQuota::new(
            Arc::new(FailingStore),
            QuotaConfig {
                daily_limit: 1000,
                free_daily: 100,
                cost_per_query: 0.005,
            },
        );
        assert_eq!(quota.cost_for(0), 0.0);
        assert_eq!(quota.cost_for(99), 0.0);
        assert_eq!(quota.cost_for(100), 0.005);
        assert_eq!(quota.cost_for(999), 0.005);
    }
}
