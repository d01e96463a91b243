//! archer-search - Web search backend implementations for archer.
//!
//! This crate provides [`SearchBackend`] implementations for use with the
//! archer context orchestrator.
//!
//! # Example
//!
//! ```ignore
//! use archer_search::GoogleSearch;
//!
//! // Credentials from config, falling back to the environment.
//! let search = GoogleSearch::from_env()?;
//! if search.is_available() {
//!     let results = search.search("osaka weather", 5).await?;
//! }
//! ```

mod google;

pub use google::GoogleSearch;

// Re-export core types for convenience
pub use archer_core::traits::{SearchBackend, SearchConfig, WebSearchResult};
