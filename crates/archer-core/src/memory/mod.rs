//! Persistent, tiered per-user memory.
//!
//! Facts live in a [`FactStore`]. The tier policy itself (what expires when)
//! is on the types in [`crate::types`]; this module only persists and sweeps.

mod store;

pub use store::{FactStore, SqliteFactStore};
