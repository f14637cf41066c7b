//! Shared utilities for cachectl
//!
//! Currently this is the logging setup used by the command-line binary.
//! Library crates only emit `tracing` events and never install a subscriber.

pub mod tracing;

pub use self::tracing::*;
