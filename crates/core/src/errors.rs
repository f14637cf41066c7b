use std::path::PathBuf;
use std::time::Duration;

/// Result type alias for cachectl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cachectl operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Another operation already holds the cache resource
    #[error("cache resource '{resource}' is busy with another operation")]
    ResourceBusy { resource: String },

    /// The external tool exited non-zero and reported errors on stderr
    #[error("{}", format_tool_error(.command, .exit_code, .stderr))]
    Tool {
        command: String,
        exit_code: Option<i32>,
        stderr: Vec<String>,
    },

    /// Tool output did not match the grammar of the requested command
    #[error("failed to parse {expected} from tool output: {input:?}")]
    Parse { expected: String, input: String },

    /// The external tool could not be started
    #[error("failed to launch '{}': {source}", .program.display())]
    Launch {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation timeout errors
    #[error("operation '{operation}' timed out after {duration:?}")]
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// A command descriptor failed validation
    #[error("invalid command descriptor: {message}")]
    InvalidDescriptor { message: String },

    /// A command name outside the tool's vocabulary
    #[error("unknown cachetool command '{value}'")]
    UnknownCommand { value: String },

    /// A backend name other than simple or blockfile
    #[error("unknown cache backend '{value}' (expected 'simple' or 'blockfile')")]
    UnknownBackend { value: String },

    /// Configuration errors
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// I/O failures while talking to a running tool
    #[error("I/O error while {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

fn format_tool_error(command: &str, exit_code: &Option<i32>, stderr: &[String]) -> String {
    let status = match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "termination by signal".to_string(),
    };
    if stderr.is_empty() {
        format!("cachetool command '{command}' failed with {status}")
    } else {
        format!(
            "cachetool command '{command}' failed with {status}: {}",
            stderr.join("\n")
        )
    }
}

// Helper methods for creating errors with context
impl Error {
    /// Create a resource busy error
    #[must_use]
    pub fn resource_busy(resource: impl Into<String>) -> Self {
        Error::ResourceBusy {
            resource: resource.into(),
        }
    }

    /// Create a tool failure error from captured stderr lines
    #[must_use]
    pub fn tool(command: impl Into<String>, exit_code: Option<i32>, stderr: Vec<String>) -> Self {
        Error::Tool {
            command: command.into(),
            exit_code,
            stderr,
        }
    }

    /// Create a parse error carrying the offending text
    #[must_use]
    pub fn parse(expected: impl Into<String>, input: impl Into<String>) -> Self {
        Error::Parse {
            expected: expected.into(),
            input: input.into(),
        }
    }

    #[must_use]
    pub fn launch(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Launch {
            program: program.into(),
            source,
        }
    }

    /// Create a timeout error
    #[must_use]
    pub fn timeout(operation: impl Into<String>, duration: Duration) -> Self {
        Error::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    #[must_use]
    pub fn invalid_descriptor(message: impl Into<String>) -> Self {
        Error::InvalidDescriptor {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Error::Configuration {
            message: message.into(),
        }
    }

    /// Create an I/O error with context
    #[must_use]
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Io {
            context: context.into(),
            source,
        }
    }

    /// Whether another operation held the resource
    #[must_use]
    pub fn is_resource_busy(&self) -> bool {
        matches!(self, Error::ResourceBusy { .. })
    }

    /// Whether the tool itself reported the failure
    #[must_use]
    pub fn is_tool_error(&self) -> bool {
        matches!(self, Error::Tool { .. })
    }

    /// Captured stderr lines, if this is a tool failure
    #[must_use]
    pub fn stderr(&self) -> Option<&[String]> {
        match self {
            Error::Tool { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}
