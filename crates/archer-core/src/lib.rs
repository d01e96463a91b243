//! archer-core - Core library for archer.
//!
//! This crate provides the memory tiering and keyword-trigger dispatch layer
//! behind the archer chat application: bilingual keyword triggers, tiered
//! per-user facts with expiration, per-turn context orchestration, and the
//! daily search quota.
//!
//! # Example
//!
//! ```ignore
//! use archer_core::{
//!     ArcherConfig, ContextOrchestrator, IntentAnalysis, ModelConfig, SearchQuota,
//!     SqliteFactStore, SqliteUsageStore,
//! };
//! use std::sync::Arc;
//!
//! let config = ArcherConfig::from_env();
//! let facts = Arc::new(SqliteFactStore::new(&config.facts_db_path)?);
//! let usage = Arc::new(SqliteUsageStore::new(&config.usage_db_path)?);
//! let quota = SearchQuota::new(usage, config.quota.clone());
//! let orchestrator = ContextOrchestrator::new(search_backend, facts, quota, config.models);
//!
//! // Per turn, with an analysis computed upstream:
//! let out = orchestrator.build_context("user1", None, &analysis).await;
//! println!("{} -> {}", out.model, out.context);
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod memory;
pub mod traits;
pub mod triggers;
pub mod types;
pub mod usage;

// Re-export commonly used types
pub use config::ArcherConfig;
pub use context::{
    ContextOrchestrator, IntentAnalysis, MemoryIntent, ModelConfig, OrchestratedContext,
    SearchIntent,
};
pub use error::{ArcherError, ArcherResult};
pub use memory::{FactStore, SqliteFactStore};
pub use traits::{SearchBackend, SearchConfig, WebSearchResult};
pub use triggers::{
    KeywordSet, KeywordTrigger, TriggerAction, TriggerCategory, TriggerCheck, TriggerContext,
    TriggerDispatcher, TriggerOutcome, TriggerRegistry,
};
pub use types::{FactCategory, MemoryFact, MemoryStats, MemoryTier, SearchUsage, UserMemory};
pub use usage::{QuotaConfig, QuotaDecision, SearchQuota, SqliteUsageStore, UsageStore};
