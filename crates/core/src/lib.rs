//! Core domain types, errors, and constants for `cachectl`.
//!
//! Everything that crosses a crate boundary lives here: the command
//! descriptor handed to the dispatcher, the raw invocation result it hands
//! back, the typed values the result interpreter produces, and the single
//! `Error` enum that every fallible operation in the workspace returns.
//!
//! ## Key Components
//!
//! - **`errors`**: the `Error` enum and `Result` alias.
//! - **`types`**: `CommandDescriptor`, `CommandKind`, `BackendKind`,
//!   `OutputMode`, `InvocationResult` and the parsed output values.
//! - **`constants`**: environment variable names and executable defaults.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::*,
};
