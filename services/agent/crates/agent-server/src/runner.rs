//! Supervised execution of external commands.
//!
//! `ProcessRunner` spawns one process per call with stderr merged into
//! stdout, collects the combined output on its own task and waits for it
//! with a hard deadline. On overrun the child's whole process group is
//! killed; the child itself is reaped before the call returns. If the call
//! is dropped before the child exits (a client disconnect), the group is
//! killed as well.

use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use fleet_common::AgentServerConfig;
use nix::sys::signal::{Signal, killpg};
use nix::unistd::Pid;
use tokio::io::AsyncReadExt;
use tokio::net::unix::pipe;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::error::RunnerError;

/// Which configured deadline applies to a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutClass {
    Short,
    Long,
}

/// Combined output and exit code of a process that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Interleaved stdout and stderr, in the order the bytes were written.
    pub output: String,
    /// Exit code; `128 + signal` when the process was killed by a signal.
    pub exit_code: i32,
}

/// Runs commands with a short or long deadline and kills them on overrun.
///
/// Calls share nothing but a spawn counter, so one runner can serve any
/// number of concurrent requests.
#[derive(Debug)]
pub struct ProcessRunner {
    short_timeout: Duration,
    long_timeout: Duration,
    spawned: AtomicU64,
}

impl ProcessRunner {
    #[must_use]
    pub fn new(short_timeout: Duration, long_timeout: Duration) -> Self {
        Self {
            short_timeout,
            long_timeout,
            spawned: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn from_config(config: &AgentServerConfig) -> Self {
        Self::new(config.short_timeout(), config.long_timeout())
    }

    #[must_use]
    pub fn timeout_for(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Short => self.short_timeout,
            TimeoutClass::Long => self.long_timeout,
        }
    }

    /// Number of processes this runner has spawned so far.
    #[must_use]
    pub fn spawned(&self) -> u64 {
        self.spawned.load(Ordering::Relaxed)
    }

    /// Run `command` with the short deadline.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessRunner::execute`].
    pub async fn run<S: AsRef<str>>(&self, command: &[S]) -> Result<CommandResult, RunnerError> {
        self.execute(command, TimeoutClass::Short).await
    }

    /// Run `command` with the long deadline (package installation and the like).
    ///
    /// # Errors
    ///
    /// Same as [`ProcessRunner::execute`].
    pub async fn run_long<S: AsRef<str>>(
        &self,
        command: &[S],
    ) -> Result<CommandResult, RunnerError> {
        self.execute(command, TimeoutClass::Long).await
    }

    /// Run with the short deadline and keep only the exit code.
    ///
    /// # Errors
    ///
    /// Same as [`ProcessRunner::execute`].
    pub async fn exit_code_only<S: AsRef<str>>(&self, command: &[S]) -> Result<i32, RunnerError> {
        Ok(self.run(command).await?.exit_code)
    }

    /// # Errors
    ///
    /// Same as [`ProcessRunner::execute`].
    pub async fn exit_code_only_long<S: AsRef<str>>(
        &self,
        command: &[S],
    ) -> Result<i32, RunnerError> {
        Ok(self.run_long(command).await?.exit_code)
    }

    /// Run `command` under the deadline of `class`.
    ///
    /// # Errors
    ///
    /// - [`RunnerError::InvalidCommand`] if `command` is empty; nothing is spawned.
    /// - [`RunnerError::Timeout`] if the deadline passed; the process group
    ///   has been killed and the child reaped.
    /// - [`RunnerError::Execution`] if spawning, reading or the output task failed.
    pub async fn execute<S: AsRef<str>>(
        &self,
        command: &[S],
        class: TimeoutClass,
    ) -> Result<CommandResult, RunnerError> {
        let Some((program, args)) = command.split_first() else {
            return Err(RunnerError::InvalidCommand);
        };
        let command_line = command
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(" ");
        let timeout = self.timeout_for(class);
        tracing::debug!(command = %command_line, ?class, "command to be executed");

        let execution_error = |source: io::Error| RunnerError::Execution {
            command: command_line.clone(),
            source,
        };

        let (mut child, reader) = self
            .spawn_merged(program.as_ref(), args)
            .map_err(execution_error)?;
        let group = ProcessGroupGuard::new(&child);
        let mut collector = OutputCollector::start(reader);

        let waited = tokio::time::timeout(timeout, async {
            let output = collector.output().await?;
            let status = child.wait().await?;
            Ok::<_, io::Error>((output, status))
        })
        .await;

        match waited {
            Ok(Ok((output, status))) => {
                // Reaped: anything still in the group was detached on purpose.
                group.disarm();
                let output = String::from_utf8_lossy(&output).into_owned();
                let exit_code = exit_code(status);
                tracing::info!(command = %command_line, exit_code, "output from command:\n{output}");
                Ok(CommandResult { output, exit_code })
            }
            Ok(Err(source)) => {
                kill_process_tree(group, &mut child, &command_line).await;
                collector.shutdown().await;
                Err(execution_error(source))
            }
            Err(_elapsed) => {
                tracing::warn!(
                    command = %command_line,
                    timeout_secs = timeout.as_secs_f64(),
                    "command timed out, killing process group"
                );
                kill_process_tree(group, &mut child, &command_line).await;
                collector.shutdown().await;
                Err(RunnerError::Timeout {
                    command: command_line,
                    timeout,
                })
            }
        }
    }

    /// Spawn `program` in its own process group with stdout and stderr
    /// sharing the write end of one pipe. Returns the child and the read end.
    fn spawn_merged<S: AsRef<str>>(
        &self,
        program: &str,
        args: &[S],
    ) -> io::Result<(Child, pipe::Receiver)> {
        let (sender, receiver) = pipe::pipe()?;
        let stdout_end: OwnedFd = sender.into_blocking_fd()?;
        let stderr_end = stdout_end.try_clone()?;

        // The command holds the parent's copies of the write end; it must be
        // dropped before reading or the pipe never reports EOF.
        let child = {
            let mut command = Command::new(program);
            command
                .args(args.iter().map(AsRef::as_ref))
                .stdin(Stdio::null())
                .stdout(stdout_end)
                .stderr(stderr_end)
                .process_group(0)
                .kill_on_drop(true);
            command.spawn()?
        };
        self.spawned.fetch_add(1, Ordering::Relaxed);
        Ok((child, receiver))
    }
}

/// Owns the task that drains the merged output pipe.
///
/// Dropping the collector aborts the task, so no exit path of
/// [`ProcessRunner::execute`] leaves it running.
struct OutputCollector {
    handle: JoinHandle<io::Result<Vec<u8>>>,
}

impl OutputCollector {
    fn start(mut reader: pipe::Receiver) -> Self {
        let handle = tokio::spawn(async move {
            let mut buf = Vec::new();
            reader.read_to_end(&mut buf).await?;
            Ok(buf)
        });
        Self { handle }
    }

    async fn output(&mut self) -> io::Result<Vec<u8>> {
        match (&mut self.handle).await {
            Ok(result) => result,
            Err(join_error) => Err(io::Error::other(join_error)),
        }
    }

    /// Abort the task and wait until it is gone.
    async fn shutdown(mut self) {
        if self.handle.is_finished() {
            return;
        }
        self.handle.abort();
        // A JoinError here is the expected cancellation.
        let _ = (&mut self.handle).await;
    }
}

impl Drop for OutputCollector {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Kills the child's process group with SIGKILL unless disarmed.
///
/// `kill_on_drop` only reaches the direct child; this guard covers its
/// descendants when `execute` is dropped mid-wait.
struct ProcessGroupGuard {
    pgid: Option<Pid>,
}

impl ProcessGroupGuard {
    fn new(child: &Child) -> Self {
        // The child leads its own group (`process_group(0)`), so its pid is the pgid.
        let pgid = child
            .id()
            .and_then(|pid| i32::try_from(pid).ok())
            .map(Pid::from_raw);
        Self { pgid }
    }

    fn kill(mut self) -> nix::Result<()> {
        match self.pgid.take() {
            Some(pgid) => killpg(pgid, Signal::SIGKILL),
            None => Ok(()),
        }
    }

    fn disarm(mut self) {
        self.pgid = None;
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        if let Some(pgid) = self.pgid.take() {
            tracing::warn!(%pgid, "command abandoned, killing process group");
            if let Err(errno) = killpg(pgid, Signal::SIGKILL) {
                tracing::debug!(%pgid, %errno, "process group already gone");
            }
        }
    }
}

/// SIGKILL the child's process group, then kill and reap the child itself.
async fn kill_process_tree(group: ProcessGroupGuard, child: &mut Child, command_line: &str) {
    if let Err(errno) = group.kill() {
        tracing::debug!(command = %command_line, %errno, "process group already gone");
    }
    if let Err(e) = child.kill().await {
        tracing::debug!(command = %command_line, error = %e, "child already exited");
    }
}

fn exit_code(status: ExitStatus) -> i32 {
    status
        .code()
        .unwrap_or_else(|| 128 + status.signal().unwrap_or(0))
}
