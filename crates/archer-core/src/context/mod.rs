//! Per-turn context building.
//!
//! Given an upstream intent analysis, the orchestrator picks the model,
//! fans out the needed sub-tasks (web search, memory retrieval), and
//! assembles their output into one context string for the LLM call.

mod analysis;
mod orchestrator;

pub use analysis::{select_model, IntentAnalysis, MemoryIntent, ModelConfig, SearchIntent};
pub use orchestrator::{
    ContextOrchestrator, OrchestratedContext, BLOCK_SEPARATOR, MEMORY_HEADER,
};
