//! Core types for archer.

mod category;
mod fact;
mod usage;

pub use category::*;
pub use fact::*;
pub use usage::*;
