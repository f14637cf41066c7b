//! Command dispatch for cachetool
//!
//! This crate owns everything between "a caller wants to run a cachetool
//! command" and "the caller holds a typed value": the per-resource in-flight
//! registry, the child-process runner, the dispatcher that ties them
//! together, the result interpreter, and a convenience client exposing one
//! method per tool command.

pub mod client;
pub mod dispatcher;
pub mod interpret;
pub mod registry;
pub mod runner;

pub use client::*;
pub use dispatcher::*;
pub use registry::*;
pub use runner::*;
