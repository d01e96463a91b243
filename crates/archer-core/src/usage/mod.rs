//! Search usage accounting and the daily quota.

mod quota;
mod store;

pub use quota::{QuotaConfig, QuotaDecision, SearchQuota};
pub use store::{SqliteUsageStore, UsageStore};
