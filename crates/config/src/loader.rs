//! Configuration loader for cachectl
//!
//! Explicit settings win over environment variables, which win over the
//! built-in defaults. The cachetool executable is searched for in this order:
//!
//! 1. the path given to [`ConfigLoader::executable`]
//! 2. `$CACHETOOL_PATH`
//! 3. `cachetool` next to the running binary, then in a sibling `bin/` directory
//! 4. `cachetool` on `$PATH`

use crate::config::Config;
use cachectl_core::{
    constants::{
        BUNDLED_BIN_DIR, CACHECTL_BACKEND_VAR, CACHECTL_QUIET_VAR, CACHECTL_TIMEOUT_VAR,
        CACHETOOL_PATH_VAR, DEFAULT_EXECUTABLE_NAME,
    },
    BackendKind, Error, Result,
};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Builder that resolves a [`Config`] from explicit settings and the environment
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    executable: Option<PathBuf>,
    backend: Option<BackendKind>,
    quiet: Option<bool>,
    timeout: Option<Duration>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this executable instead of searching for one
    pub fn executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = Some(quiet);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve the configuration
    pub fn load(self) -> Result<Config> {
        let executable = match self.executable {
            Some(path) => path,
            None => discover_executable()?,
        };

        let default_backend = match self.backend {
            Some(backend) => backend,
            None => match non_empty_var(CACHECTL_BACKEND_VAR) {
                Some(value) => value.parse().map_err(|e| {
                    Error::configuration(format!("{CACHECTL_BACKEND_VAR}: {e}"))
                })?,
                None => BackendKind::default(),
            },
        };

        let quiet = match self.quiet {
            Some(quiet) => quiet,
            None => match non_empty_var(CACHECTL_QUIET_VAR) {
                Some(value) => parse_bool(CACHECTL_QUIET_VAR, &value)?,
                None => false,
            },
        };

        let timeout = match self.timeout {
            Some(timeout) => Some(timeout),
            None => non_empty_var(CACHECTL_TIMEOUT_VAR)
                .map(|value| parse_timeout(&value))
                .transpose()?,
        };

        tracing::debug!(
            executable = %executable.display(),
            backend = %default_backend,
            quiet,
            ?timeout,
            "configuration loaded"
        );

        Ok(Config {
            executable,
            default_backend,
            quiet,
            timeout,
        })
    }
}

fn discover_executable() -> Result<PathBuf> {
    if let Some(path) = non_empty_var(CACHETOOL_PATH_VAR) {
        let path = PathBuf::from(path);
        if !path.is_file() {
            return Err(Error::configuration(format!(
                "{CACHETOOL_PATH_VAR} points to '{}', which is not a file",
                path.display()
            )));
        }
        return Ok(path);
    }

    if let Some(path) = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().and_then(bundled_executable))
    {
        return Ok(path);
    }

    which::which(DEFAULT_EXECUTABLE_NAME).map_err(|e| {
        Error::configuration(format!(
            "could not find '{DEFAULT_EXECUTABLE_NAME}' ({e}); set {CACHETOOL_PATH_VAR} or pass an explicit path"
        ))
    })
}

/// Look for the tool shipped alongside our own binary
fn bundled_executable(dir: &Path) -> Option<PathBuf> {
    let name = format!("{DEFAULT_EXECUTABLE_NAME}{}", env::consts::EXE_SUFFIX);
    [dir.join(&name), dir.join(BUNDLED_BIN_DIR).join(&name)]
        .into_iter()
        .find(|candidate| candidate.is_file())
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::configuration(format!(
            "{name}: expected a boolean, got '{other}'"
        ))),
    }
}

fn parse_timeout(value: &str) -> Result<Duration> {
    let secs: u64 = value.trim().parse().map_err(|_| {
        Error::configuration(format!(
            "{CACHECTL_TIMEOUT_VAR}: expected whole seconds, got '{value}'"
        ))
    })?;
    if secs == 0 {
        return Err(Error::configuration(format!(
            "{CACHECTL_TIMEOUT_VAR}: timeout must be greater than zero"
        )));
    }
    Ok(Duration::from_secs(secs))
}
