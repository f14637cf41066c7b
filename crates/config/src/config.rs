//! The resolved, immutable configuration shared by the dispatcher and the CLI.

use cachectl_core::BackendKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Immutable configuration produced by [`crate::ConfigLoader`].
///
/// It is `Clone + Send + Sync` so one instance can back any number of
/// dispatchers running on different tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Absolute or PATH-resolved location of the cachetool binary
    pub executable: PathBuf,

    /// Backend used when a caller does not name one
    pub default_backend: BackendKind,

    /// Suppress invocation logging
    pub quiet: bool,

    /// Kill the tool if it runs longer than this; `None` waits forever
    pub timeout: Option<Duration>,
}

impl Config {
    /// Create a configuration for a known executable with default settings
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            default_backend: BackendKind::default(),
            quiet: false,
            timeout: None,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }
}
