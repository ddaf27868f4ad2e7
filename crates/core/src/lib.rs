//! Shared domain types for the generation queue.
//!
//! Zero internal dependencies: job ids, lifecycle states, generation
//! parameters, and the error taxonomy used by every other crate.

pub mod error;
pub mod generation;
pub mod job;
pub mod types;
