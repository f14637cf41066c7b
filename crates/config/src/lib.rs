//! Configuration for cachectl
//!
//! This crate decides which cachetool executable is driven and the defaults
//! applied to every dispatch (backend, quiet mode, optional timeout).

pub mod config;
pub mod loader;

pub use config::*;
pub use loader::*;
