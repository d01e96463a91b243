//! Usage records for quota accounting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One recorded web search, the unit the daily quota counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchUsage {
    /// Unique record id.
    pub id: String,
    /// User who issued the search.
    pub user_id: String,
    /// The query that was sent to the search backend.
    pub query: String,
    /// Number of results returned.
    pub result_count: usize,
    /// Estimated cost in USD for this search.
    pub estimated_cost: f64,
    /// When the search happened.
    pub timestamp: DateTime<Utc>,
}

impl SearchUsage {
    /// Record a search that just happened.
    pub fn new(user_id: impl Into<String>, query: impl Into<String>, result_count: usize) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            query: query.into(),
            result_count,
            estimated_cost: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Set the estimated cost.
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.estimated_cost = cost;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_serde_roundtrip() {
        let usage = SearchUsage::new("user1", "weather in osaka", 5).with_cost(0.005);
        let json = serde_json::to_string(&usage).unwrap();
        let parsed: SearchUsage = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, usage);
    }
}
