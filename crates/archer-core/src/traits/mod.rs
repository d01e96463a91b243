//! Core traits for archer backends.

mod search;

pub use search::*;
