//! Memory engine orchestration module.

pub mod core;

pub use core::{IngestedDocument, MemoryEngine};
