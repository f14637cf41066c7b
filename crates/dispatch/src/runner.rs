use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use cachectl_core::{CapturedStdout, Error, InvocationResult, OutputMode, Result};
use std::io;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};

const READ_CHUNK_SIZE: usize = 64 * 1024;

/// A fully resolved process launch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub argv: Vec<String>,
    pub output_mode: OutputMode,
    pub stdin: Option<Bytes>,
}

/// Trait for running the external tool
/// This abstraction allows the dispatcher to be tested without spawning
/// real processes
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run to completion: the process has exited and both output streams are drained
    async fn run(&self, invocation: &Invocation) -> Result<InvocationResult>;
}

/// Production implementation that spawns real processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<InvocationResult> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.argv)
            .stdin(if invocation.stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| Error::launch(&invocation.program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::io("capturing stdout", io::Error::other("stdout not piped")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::io("capturing stderr", io::Error::other("stderr not piped")))?;

        let (_, stdout, stderr) = tokio::try_join!(
            feed_stdin(child.stdin.take(), invocation.stdin.clone()),
            capture_stdout(stdout, invocation.output_mode),
            read_lines(stderr),
        )
        .map_err(|e| Error::io("reading cachetool output", e))?;

        let status = child
            .wait()
            .await
            .map_err(|e| Error::io("waiting for cachetool to exit", e))?;

        tracing::debug!(
            program = %invocation.program.display(),
            exit_code = ?status.code(),
            stderr_lines = stderr.len(),
            "cachetool streams drained"
        );

        Ok(InvocationResult {
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Write the payload and close the pipe so the tool sees EOF
async fn feed_stdin(pipe: Option<ChildStdin>, payload: Option<Bytes>) -> io::Result<()> {
    let (Some(mut pipe), Some(payload)) = (pipe, payload) else {
        return Ok(());
    };

    let written = async {
        pipe.write_all(&payload).await?;
        pipe.shutdown().await
    }
    .await;

    match written {
        // The tool may exit without reading its input.
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other,
    }
}

async fn capture_stdout<R>(reader: R, mode: OutputMode) -> io::Result<CapturedStdout>
where
    R: AsyncRead + Unpin,
{
    match mode {
        OutputMode::Text => read_lines(reader).await.map(CapturedStdout::Text),
        OutputMode::Document => read_document(reader).await.map(CapturedStdout::Text),
        OutputMode::Binary => read_chunks(reader).await.map(CapturedStdout::Binary),
    }
}

/// One trimmed string per non-blank line; invalid UTF-8 is replaced
async fn read_lines<R>(reader: R) -> io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    let mut buf = Vec::new();

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }

    Ok(lines)
}

/// All of stdout decoded as one chunk and trimmed at the ends only.
///
/// Empty output yields no chunk at all.
async fn read_document<R>(mut reader: R) -> io::Result<Vec<String>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;

    let text = String::from_utf8_lossy(&buf);
    let text = text.trim();
    if text.is_empty() {
        Ok(Vec::new())
    } else {
        Ok(vec![text.to_string()])
    }
}

/// Raw chunks in arrival order
async fn read_chunks<R>(mut reader: R) -> io::Result<Vec<Bytes>>
where
    R: AsyncRead + Unpin,
{
    let mut chunks = Vec::new();

    loop {
        let mut buf = BytesMut::with_capacity(READ_CHUNK_SIZE);
        if reader.read_buf(&mut buf).await? == 0 {
            break;
        }
        chunks.push(buf.freeze());
    }

    Ok(chunks)
}

/// Test implementation that returns canned results per tool command
#[cfg(test)]
pub struct StaticRunner {
    responses: std::sync::Mutex<std::collections::HashMap<String, InvocationResult>>,
    calls: std::sync::Mutex<Vec<Invocation>>,
}

#[cfg(test)]
impl StaticRunner {
    pub fn new() -> Self {
        Self {
            responses: std::sync::Mutex::new(std::collections::HashMap::new()),
            calls: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Respond to `command` (the third argv entry) with `result`
    pub fn respond(&self, command: &str, result: InvocationResult) {
        self.responses
            .lock()
            .expect("responses lock")
            .insert(command.to_string(), result);
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ProcessRunner for StaticRunner {
    async fn run(&self, invocation: &Invocation) -> Result<InvocationResult> {
        self.calls
            .lock()
            .expect("calls lock")
            .push(invocation.clone());

        let command = invocation.argv.get(2).cloned().unwrap_or_default();
        self.responses
            .lock()
            .expect("responses lock")
            .get(&command)
            .cloned()
            .ok_or_else(|| Error::configuration(format!("no canned response for '{command}'")))
    }
}
