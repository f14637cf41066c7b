//! The dispatcher: one guarded tool invocation per call.

use crate::registry::InFlightRegistry;
use crate::runner::{Invocation, ProcessRunner, SystemProcessRunner};
use cachectl_config::Config;
use cachectl_core::{CommandDescriptor, Error, InvocationResult, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Runs cachetool commands, allowing at most one in-flight operation per
/// cache resource.
///
/// Clones share the same registry and runner, so a resource claimed through
/// one clone is busy for all of them.
#[derive(Clone)]
pub struct Dispatcher {
    program: PathBuf,
    runner: Arc<dyn ProcessRunner>,
    registry: Arc<InFlightRegistry>,
    timeout: Option<Duration>,
}

impl Dispatcher {
    /// Dispatcher that spawns `program` as a real child process
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self::with_runner(program, Arc::new(SystemProcessRunner))
    }

    pub fn with_runner(program: impl Into<PathBuf>, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            program: program.into(),
            runner,
            registry: Arc::new(InFlightRegistry::new()),
            timeout: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let dispatcher = Self::new(config.executable.clone());
        match config.timeout {
            Some(timeout) => dispatcher.with_timeout(timeout),
            None => dispatcher,
        }
    }

    /// Kill the tool and fail with `Error::Timeout` if it runs longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn registry(&self) -> &InFlightRegistry {
        &self.registry
    }

    /// Whether an operation currently holds `resource`
    pub fn is_in_flight(&self, resource: &str) -> bool {
        self.registry.contains(resource)
    }

    /// Run one command and classify its outcome.
    ///
    /// Fails with `ResourceBusy` without launching anything if the resource is
    /// already held. The claim is released on every exit path once the tool
    /// has exited (or been killed) and its output is drained.
    ///
    /// A non-zero exit is only an error when the tool also wrote to stderr;
    /// a silent non-zero exit resolves with whatever stdout was captured.
    pub async fn dispatch(&self, descriptor: &CommandDescriptor) -> Result<InvocationResult> {
        let _claim = self.registry.try_acquire(descriptor.resource())?;

        let invocation = Invocation {
            program: self.program.clone(),
            argv: descriptor.argv(),
            output_mode: descriptor.output_mode(),
            stdin: descriptor.stdin().cloned(),
        };
        let quiet = descriptor.quiet();

        if !quiet {
            tracing::info!(
                program = %self.program.display(),
                args = %invocation.argv.join(" "),
                "running cachetool"
            );
        }

        let started = Instant::now();
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.runner.run(&invocation))
                .await
                .map_err(|_| Error::timeout(descriptor.command().as_str(), limit))?,
            None => self.runner.run(&invocation).await,
        }?;

        if !quiet {
            tracing::info!(
                command = %descriptor.command(),
                exit_code = ?result.exit_code,
                duration_ms = started.elapsed().as_millis() as u64,
                "cachetool process exited"
            );
        }

        if !result.succeeded() && !result.stderr.is_empty() {
            if !quiet {
                tracing::warn!(
                    command = %descriptor.command(),
                    error = %result.stderr.join("\n"),
                    "cachetool reported an error"
                );
            }
            return Err(Error::tool(
                descriptor.command().as_str(),
                result.exit_code,
                result.stderr,
            ));
        }

        Ok(result)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("program", &self.program)
            .field("in_flight", &self.registry.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::StaticRunner;
    use async_trait::async_trait;
    use cachectl_core::{CapturedStdout, CommandKind, OutputMode};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::{Notify, Semaphore};

    fn descriptor(resource: &str, command: CommandKind) -> CommandDescriptor {
        CommandDescriptor::builder(resource, command)
            .quiet(true)
            .build()
            .expect("valid descriptor")
    }

    fn text_result(exit_code: i32, stdout: &[&str], stderr: &[&str]) -> InvocationResult {
        InvocationResult {
            exit_code: Some(exit_code),
            stdout: CapturedStdout::Text(stdout.iter().map(|s| s.to_string()).collect()),
            stderr: stderr.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Runner that parks every call until released, counting launches
    struct GatedRunner {
        launched: AtomicUsize,
        started: Notify,
        gate: Semaphore,
    }

    impl GatedRunner {
        fn new() -> Self {
            Self {
                launched: AtomicUsize::new(0),
                started: Notify::new(),
                gate: Semaphore::new(0),
            }
        }

        fn release(&self, calls: usize) {
            self.gate.add_permits(calls);
        }
    }

    #[async_trait]
    impl ProcessRunner for GatedRunner {
        async fn run(&self, _invocation: &Invocation) -> Result<InvocationResult> {
            self.launched.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            let permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| Error::configuration(e.to_string()))?;
            permit.forget();
            Ok(text_result(0, &["done"], &[]))
        }
    }

    #[tokio::test]
    async fn success_returns_captured_stdout() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond("list_keys", text_result(0, &["k1", "k2"], &[]));
        let dispatcher = Dispatcher::with_runner("/bin/cachetool", runner.clone());

        let result = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::ListKeys))
            .await
            .expect("dispatch succeeds");

        assert_eq!(result.stdout.into_lines(), vec!["k1", "k2"]);
        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].program, PathBuf::from("/bin/cachetool"));
        assert_eq!(calls[0].argv, vec!["/cache", "simple", "list_keys"]);
        assert_eq!(calls[0].output_mode, OutputMode::Text);
        assert!(!dispatcher.is_in_flight("/cache"));
    }

    #[tokio::test]
    async fn non_zero_exit_with_empty_stderr_resolves() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond("get_size", text_result(3, &["42"], &[]));
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let result = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::GetSize))
            .await
            .expect("silent failure still resolves");
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stdout.into_lines(), vec!["42"]);
    }

    #[tokio::test]
    async fn non_zero_exit_with_empty_stdout_and_stderr_resolves_empty() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond("stop", text_result(1, &[], &[]));
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let result = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::Stop))
            .await
            .expect("resolves");
        assert!(result.stdout.is_empty());
    }

    #[tokio::test]
    async fn non_zero_exit_with_stderr_is_tool_error() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond(
            "delete_key",
            text_result(1, &["partial"], &["Invalid key", "Unable to delete"]),
        );
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let err = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::DeleteKey))
            .await
            .expect_err("tool failure");

        match err {
            Error::Tool {
                command,
                exit_code,
                stderr,
            } => {
                assert_eq!(command, "delete_key");
                assert_eq!(exit_code, Some(1));
                assert_eq!(stderr, vec!["Invalid key", "Unable to delete"]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!dispatcher.is_in_flight("/cache"));
    }

    #[tokio::test]
    async fn zero_exit_with_stderr_is_success() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond("list_dups", text_result(0, &["1, a, b"], &["warning: slow disk"]));
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let result = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::ListDups))
            .await
            .expect("warnings alone are not failures");
        assert_eq!(result.stderr, vec!["warning: slow disk"]);
    }

    #[tokio::test]
    async fn signal_termination_with_stderr_is_tool_error() {
        let runner = Arc::new(StaticRunner::new());
        runner.respond(
            "get_size",
            InvocationResult {
                exit_code: None,
                stdout: CapturedStdout::Text(vec![]),
                stderr: vec!["Segmentation fault".to_string()],
            },
        );
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let err = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::GetSize))
            .await
            .expect_err("killed tool with stderr fails");
        assert!(err.is_tool_error());
    }

    #[tokio::test]
    async fn runner_error_releases_resource() {
        let runner = Arc::new(StaticRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner);

        let err = dispatcher
            .dispatch(&descriptor("/cache", CommandKind::Batch))
            .await
            .expect_err("no canned response");
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test]
    async fn same_resource_is_busy_while_in_flight() {
        let runner = Arc::new(GatedRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner.clone());

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&descriptor("/cache/a", CommandKind::ListKeys))
                    .await
            })
        };
        runner.started.notified().await;
        assert!(dispatcher.is_in_flight("/cache/a"));

        let err = dispatcher
            .dispatch(&descriptor("/cache/a", CommandKind::GetSize))
            .await
            .expect_err("second dispatch must be rejected");
        match &err {
            Error::ResourceBusy { resource } => assert_eq!(resource, "/cache/a"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(runner.launched.load(Ordering::SeqCst), 1);

        runner.release(1);
        first
            .await
            .expect("task joined")
            .expect("first dispatch succeeds");
        assert!(!dispatcher.is_in_flight("/cache/a"));

        runner.release(1);
        dispatcher
            .dispatch(&descriptor("/cache/a", CommandKind::GetSize))
            .await
            .expect("resource free again");
    }

    #[tokio::test]
    async fn distinct_resources_run_concurrently() {
        let runner = Arc::new(GatedRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner.clone());

        let spawn = |resource: &'static str| {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&descriptor(resource, CommandKind::ListKeys))
                    .await
            })
        };
        let a = spawn("/cache/a");
        runner.started.notified().await;
        let b = spawn("/cache/b");
        runner.started.notified().await;

        assert_eq!(runner.launched.load(Ordering::SeqCst), 2);
        assert!(dispatcher.is_in_flight("/cache/a"));
        assert!(dispatcher.is_in_flight("/cache/b"));

        runner.release(2);
        a.await.expect("joined").expect("a succeeds");
        b.await.expect("joined").expect("b succeeds");
        assert!(dispatcher.registry().is_empty());
    }

    #[tokio::test]
    async fn concurrent_burst_on_one_resource_launches_once() {
        let runner = Arc::new(GatedRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner.clone());

        let first = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&descriptor("/cache/hot", CommandKind::ListKeys))
                    .await
            })
        };
        runner.started.notified().await;

        let attempts = futures::future::join_all((0..8).map(|_| {
            let dispatcher = dispatcher.clone();
            async move {
                dispatcher
                    .dispatch(&descriptor("/cache/hot", CommandKind::ListKeys))
                    .await
            }
        }))
        .await;
        assert!(attempts
            .iter()
            .all(|r| matches!(r, Err(Error::ResourceBusy { .. }))));

        runner.release(1);
        first.await.expect("joined").expect("first succeeds");
        assert_eq!(runner.launched.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_and_releases_resource() {
        let runner = Arc::new(GatedRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner)
            .with_timeout(Duration::from_secs(5));

        let err = dispatcher
            .dispatch(&descriptor("/cache/slow", CommandKind::GetSize))
            .await
            .expect_err("never released, must time out");
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(!dispatcher.is_in_flight("/cache/slow"));
    }

    #[tokio::test]
    async fn cancelled_dispatch_releases_resource() {
        let runner = Arc::new(GatedRunner::new());
        let dispatcher = Dispatcher::with_runner("cachetool", runner.clone());

        let task = {
            let dispatcher = dispatcher.clone();
            tokio::spawn(async move {
                dispatcher
                    .dispatch(&descriptor("/cache/a", CommandKind::ListKeys))
                    .await
            })
        };
        runner.started.notified().await;
        assert!(dispatcher.is_in_flight("/cache/a"));

        task.abort();
        let _ = task.await;
        assert!(!dispatcher.is_in_flight("/cache/a"));
    }
}
