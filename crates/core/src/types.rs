use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::STREAM_TEXT_SEPARATOR;
use crate::errors::{Error, Result};

/// Storage layout of a cache resource
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Simple,
    Blockfile,
}

impl BackendKind {
    /// Name passed on the tool's command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BackendKind::Simple => "simple",
            BackendKind::Blockfile => "blockfile",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(BackendKind::Simple),
            "blockfile" => Ok(BackendKind::Blockfile),
            _ => Err(Error::UnknownBackend {
                value: s.to_string(),
            }),
        }
    }
}

/// The fixed command vocabulary understood by cachetool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    DeleteKey,
    DeleteStream,
    GetSize,
    GetStream,
    ListKeys,
    ListDups,
    UpdateRawHeaders,
    /// Opens the cache and exits; confirms the cache exists and has the given backend
    Stop,
    /// Reads serialized commands from stdin until `stop`
    Batch,
}

impl CommandKind {
    pub const ALL: [CommandKind; 9] = [
        CommandKind::DeleteKey,
        CommandKind::DeleteStream,
        CommandKind::GetSize,
        CommandKind::GetStream,
        CommandKind::ListKeys,
        CommandKind::ListDups,
        CommandKind::UpdateRawHeaders,
        CommandKind::Stop,
        CommandKind::Batch,
    ];

    /// Name passed on the tool's command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CommandKind::DeleteKey => "delete_key",
            CommandKind::DeleteStream => "delete_stream",
            CommandKind::GetSize => "get_size",
            CommandKind::GetStream => "get_stream",
            CommandKind::ListKeys => "list_keys",
            CommandKind::ListDups => "list_dups",
            CommandKind::UpdateRawHeaders => "update_raw_headers",
            CommandKind::Stop => "stop",
            CommandKind::Batch => "batch",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownCommand {
                value: s.to_string(),
            })
    }
}

/// How stdout of the tool is captured
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// One trimmed string per non-blank line
    #[default]
    Text,
    /// The whole of stdout as one trimmed string, line breaks kept
    Document,
    /// Raw byte chunks exactly as read
    Binary,
}

impl OutputMode {
    /// Stream 0 is returned as raw bytes; any other stream is read as one document
    #[must_use]
    pub const fn for_stream_index(index: u32) -> Self {
        if index > 0 {
            OutputMode::Document
        } else {
            OutputMode::Binary
        }
    }
}

/// A single, immutable request to run cachetool against one cache resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDescriptor {
    resource: String,
    backend: BackendKind,
    command: CommandKind,
    args: Vec<String>,
    output_mode: OutputMode,
    quiet: bool,
    stdin: Option<Bytes>,
}

impl CommandDescriptor {
    /// Start building a descriptor for `command` against `resource`
    pub fn builder(resource: impl Into<String>, command: CommandKind) -> CommandDescriptorBuilder {
        CommandDescriptorBuilder {
            resource: resource.into(),
            backend: BackendKind::default(),
            command,
            args: Vec::new(),
            output_mode: OutputMode::default(),
            quiet: false,
            stdin: None,
        }
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    #[must_use]
    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    #[must_use]
    pub fn command(&self) -> CommandKind {
        self.command
    }

    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn output_mode(&self) -> OutputMode {
        self.output_mode
    }

    #[must_use]
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    #[must_use]
    pub fn stdin(&self) -> Option<&Bytes> {
        self.stdin.as_ref()
    }

    /// The tool's argument vector: `[resource, backend, command, ...args]`
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        let mut argv = Vec::with_capacity(3 + self.args.len());
        argv.push(self.resource.clone());
        argv.push(self.backend.as_str().to_string());
        argv.push(self.command.as_str().to_string());
        argv.extend(self.args.iter().cloned());
        argv
    }
}

/// Builder for [`CommandDescriptor`]
#[derive(Debug, Clone)]
pub struct CommandDescriptorBuilder {
    resource: String,
    backend: BackendKind,
    command: CommandKind,
    args: Vec<String>,
    output_mode: OutputMode,
    quiet: bool,
    stdin: Option<Bytes>,
}

impl CommandDescriptorBuilder {
    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Bytes written to the tool's standard input, which is then closed
    pub fn stdin(mut self, payload: impl Into<Bytes>) -> Self {
        self.stdin = Some(payload.into());
        self
    }

    /// Validate and freeze the descriptor
    pub fn build(self) -> Result<CommandDescriptor> {
        if self.resource.trim().is_empty() {
            return Err(Error::invalid_descriptor(
                "resource identifier must not be empty",
            ));
        }

        Ok(CommandDescriptor {
            resource: self.resource,
            backend: self.backend,
            command: self.command,
            args: self.args,
            output_mode: self.output_mode,
            quiet: self.quiet,
            stdin: self.stdin,
        })
    }
}

/// Stdout as captured from one invocation, shaped by the requested [`OutputMode`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedStdout {
    Text(Vec<String>),
    Binary(Vec<Bytes>),
}

impl CapturedStdout {
    #[must_use]
    pub fn empty(mode: OutputMode) -> Self {
        match mode {
            OutputMode::Text | OutputMode::Document => CapturedStdout::Text(Vec::new()),
            OutputMode::Binary => CapturedStdout::Binary(Vec::new()),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            CapturedStdout::Text(lines) => lines.is_empty(),
            CapturedStdout::Binary(chunks) => chunks.is_empty(),
        }
    }

    /// Text lines; binary chunks are decoded lossily and trimmed
    #[must_use]
    pub fn into_lines(self) -> Vec<String> {
        match self {
            CapturedStdout::Text(lines) => lines,
            CapturedStdout::Binary(chunks) => chunks
                .iter()
                .map(|chunk| String::from_utf8_lossy(chunk).trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
        }
    }
}

/// Everything observed from one finished tool process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub stdout: CapturedStdout,
    pub stderr: Vec<String>,
}

impl InvocationResult {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Content of one stream of a cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamContent {
    /// A stream other than 0 as text; separate text chunks are joined with `,`
    Text(String),
    /// Stream 0, chunk by chunk, unmodified
    Binary(Vec<Bytes>),
}

impl StreamContent {
    /// Join captured text chunks the way the tool's stream listing is presented
    #[must_use]
    pub fn join_text(chunks: &[String]) -> Self {
        StreamContent::Text(chunks.join(STREAM_TEXT_SEPARATOR))
    }

    /// Flatten into one contiguous buffer
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            StreamContent::Text(text) => text.as_bytes().to_vec(),
            StreamContent::Binary(chunks) => chunks.iter().flat_map(|c| c.iter().copied()).collect(),
        }
    }
}

/// One cache entry whose body is shared with another entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// Body size in bytes
    pub size: u64,
    pub key: String,
    pub mime: String,
}
