//! Keyword-trigger dispatch for incoming chat messages.
//!
//! Every user message is checked against a fixed registry of keyword
//! triggers. A trigger couples an id (`"intention.web_search"`,
//! `"memory.general"`, ...) with a bilingual [`KeywordSet`] and an optional
//! async [`TriggerAction`]:
//! - `Intention` triggers detect that the user wants something done now
//!   (web search, image generation).
//! - `Memory` triggers detect statements worth remembering or recalling.
//!
//! The registry is built once at startup and frozen; dispatch is read-only
//! and safe to share across request handlers behind `Arc`. Matching is
//! case-folded substring containment, so checks are cheap enough to run on
//! every message.
//!
//! # Example
//!
//! ```
//! use archer_core::triggers::{
//!     KeywordSet, KeywordTrigger, TriggerCategory, TriggerDispatcher, TriggerRegistry,
//! };
//! use std::sync::Arc;
//!
//! let registry = TriggerRegistry::builder()
//!     .register(KeywordTrigger::new(
//!         "intention.web_search",
//!         TriggerCategory::Intention,
//!         KeywordSet::new(
//!             vec!["search".to_string()],
//!             vec!["搜索".to_string()],
//!         ),
//!     ))
//!     .build();
//!
//! let dispatcher = TriggerDispatcher::new(Arc::new(registry));
//! let checks = dispatcher.check("Search for panda facts");
//! assert!(checks[0].matched);
//! assert_eq!(checks[0].matched_keywords, vec!["search"]);
//! ```

mod defaults;
mod dispatch;
mod matcher;
mod registry;
mod types;

pub use defaults::{
    default_registry, default_triggers, IMAGE_GEN_KIND, MEMORY_GENERAL_KIND, MEMORY_RECALL_KIND,
    WEB_SEARCH_KIND,
};
pub use dispatch::TriggerDispatcher;
pub use matcher::KeywordSet;
pub use registry::{TriggerRegistry, TriggerRegistryBuilder};
pub use types::{
    DispatchEntry, DispatchOutcome, DispatchReport, KeywordTrigger, TriggerAction,
    TriggerCategory, TriggerCheck, TriggerContext, TriggerOutcome,
};
