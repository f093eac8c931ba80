// src/system/executor.rs

use crate::{
    CancellationToken,
    constants::{CANCEL_DRAIN_GRACE, POLL_INTERVAL, RELAY_BUFFER_SIZE},
    core::invocation::{self, Invocation, Wiring},
    models::ExecConfig,
};
use std::fmt;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command as StdCommand, ExitStatus, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Instant;
use thiserror::Error;

/// Everything that can go wrong while launching a command.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// There were no positional arguments.
    #[error("No command specified to run.")]
    EmptyCommand,
    /// The working directory is missing or is not a directory.
    #[error("Working directory '{path}' cannot be used: {source}")]
    WorkingDir {
        /// The directory as configured.
        path: String,
        /// Why it was rejected.
        #[source]
        source: io::Error,
    },
    /// The operating system refused to create the process.
    #[error("Command '{command}' could not be started: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// The spawn error.
        #[source]
        source: io::Error,
    },
    /// The process exited with a failing status.
    #[error("Command '{command}' exited with a non-zero status ({status}).")]
    NonZeroExitStatus {
        /// The command line.
        command: String,
        /// The status it exited with.
        status: ExitStatus,
    },
    /// Polling the child for its exit status failed.
    #[error("Lost track of command '{command}': {source}")]
    Wait {
        /// The command line.
        command: String,
        /// The wait error.
        #[source]
        source: io::Error,
    },
    /// The child exited successfully but its output could not be read or
    /// written to the caller's sinks.
    #[error("Output of command '{command}' could not be relayed: {source}")]
    Relay {
        /// The command line.
        command: String,
        /// The first read or write error.
        #[source]
        source: io::Error,
    },
    /// The cancellation token was set.
    #[error("Command '{command}' was cancelled.")]
    Cancelled {
        /// The command line.
        command: String,
    },
}

/// Coarse classification of an [`ExecutionError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Detected before any process exists. Never suppressed.
    Configuration,
    /// The process could not be created.
    Launch,
    /// The process ran but did not succeed.
    Runtime,
    /// The caller cancelled the run. Never suppressed.
    Cancellation,
}

impl ExecutionError {
    /// Classifies the error for suppression and exit-code purposes.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCommand => ErrorKind::Configuration,
            Self::WorkingDir { .. } | Self::Spawn { .. } => ErrorKind::Launch,
            Self::NonZeroExitStatus { .. } | Self::Wait { .. } | Self::Relay { .. } => {
                ErrorKind::Runtime
            }
            Self::Cancelled { .. } => ErrorKind::Cancellation,
        }
    }

    /// Whether `IgnoreErrors` may turn this error into a success.
    pub fn is_suppressible(&self) -> bool {
        matches!(self.kind(), ErrorKind::Launch | ErrorKind::Runtime)
    }

    /// The state a run ends in when it fails with this error.
    pub fn final_state(&self) -> RunState {
        match self {
            Self::EmptyCommand => RunState::Unstarted,
            Self::WorkingDir { .. } | Self::Spawn { .. } | Self::Wait { .. } => RunState::Failed,
            Self::NonZeroExitStatus { .. } | Self::Relay { .. } => RunState::Completed,
            Self::Cancelled { .. } => RunState::Cancelled,
        }
    }
}

/// Lifecycle of one launch. `Completed`, `Failed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Nothing has been attempted yet.
    Unstarted,
    /// Preparing and spawning the process.
    Launching,
    /// The process exists and is being supervised.
    Running,
    /// The process exited, with any status.
    Completed,
    /// The process could not be created or supervised.
    Failed,
    /// The caller's token was set; any running process was killed.
    Cancelled,
}

/// A successful result of [`execute`].
#[derive(Debug)]
pub enum Outcome {
    /// The process exited with status zero.
    Success,
    /// The process failed but `IgnoreErrors` was set. Carries the swallowed error.
    Suppressed(ExecutionError),
}

impl Outcome {
    /// The error that `IgnoreErrors` swallowed, if any.
    pub fn suppressed(&self) -> Option<&ExecutionError> {
        match self {
            Self::Success => None,
            Self::Suppressed(e) => Some(e),
        }
    }

    /// The state the run ended in.
    pub fn final_state(&self) -> RunState {
        match self {
            Self::Success => RunState::Completed,
            Self::Suppressed(e) => e.final_state(),
        }
    }
}

/// The caller-supplied standard streams for one launch.
///
/// The input is owned because it is fed from a detached thread: a source that
/// blocks (a terminal, for instance) must not keep the launch alive after the
/// child exits. Output sinks are borrowed for the duration of the launch.
pub struct Streams<'a> {
    /// Fed to the child's standard input until exhausted.
    ///
    /// Copying stops when the child exits. Anything the feeding thread has
    /// already read from the source by then is dropped, so a source shared
    /// with later launches may lose input.
    pub stdin: Box<dyn Read + Send>,
    /// Receives the child's standard output.
    pub stdout: &'a mut (dyn Write + Send),
    /// Receives the child's standard error, unless it is discarded.
    pub stderr: &'a mut (dyn Write + Send),
}

impl<'a> Streams<'a> {
    /// Bundles the three streams for [`execute`].
    pub fn new(
        stdin: Box<dyn Read + Send>,
        stdout: &'a mut (dyn Write + Send),
        stderr: &'a mut (dyn Write + Send),
    ) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

impl fmt::Debug for Streams<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streams").finish_non_exhaustive()
    }
}

struct Lifecycle<'a> {
    command: &'a str,
    state: RunState,
}

impl Lifecycle<'_> {
    fn advance(&mut self, next: RunState) {
        log::trace!("'{}': {:?} -> {:?}", self.command, self.state, next);
        self.state = next;
    }
}

/// Launches `invocation` under `config` and blocks until it exits or is cancelled.
///
/// The cancellation token is polled for the whole lifetime of the child; once
/// set, the child is killed and reaped before returning
/// [`ExecutionError::Cancelled`]. A sink that rejects the child's output
/// fails an otherwise successful run with [`ExecutionError::Relay`]. Launch and
/// runtime failures become [`Outcome::Suppressed`] when `config.ignore_errors`
/// is set.
pub fn execute(
    invocation: &Invocation,
    config: &ExecConfig,
    cancellation_token: &CancellationToken,
    streams: Streams<'_>,
) -> Result<Outcome, ExecutionError> {
    let command_line = invocation.to_string();
    let mut lifecycle = Lifecycle {
        command: &command_line,
        state: RunState::Unstarted,
    };

    let result = run_to_exit(invocation, config, cancellation_token, streams, &mut lifecycle);
    lifecycle.advance(match &result {
        Ok(()) => RunState::Completed,
        Err(e) => e.final_state(),
    });

    match result {
        Ok(()) => Ok(Outcome::Success),
        Err(e) if config.ignore_errors && e.is_suppressible() => {
            log::debug!("Ignoring failure as requested: {}", e);
            Ok(Outcome::Suppressed(e))
        }
        Err(e) => Err(e),
    }
}

fn run_to_exit(
    invocation: &Invocation,
    config: &ExecConfig,
    cancellation_token: &CancellationToken,
    streams: Streams<'_>,
    lifecycle: &mut Lifecycle<'_>,
) -> Result<(), ExecutionError> {
    let command_line = lifecycle.command;
    lifecycle.advance(RunState::Launching);

    // Pre-flight cancellation check.
    if cancellation_token.load(Ordering::SeqCst) {
        return Err(ExecutionError::Cancelled {
            command: command_line.to_string(),
        });
    }

    let wiring = Wiring::for_config(config);
    let mut command = StdCommand::new(&invocation.program);
    command
        .args(&invocation.args)
        .env_clear()
        .envs(invocation::derive_environment(config, std::env::vars_os()))
        .stdin(pipe_or_null(wiring.stdin))
        .stdout(pipe_or_null(wiring.stdout))
        .stderr(pipe_or_null(wiring.stderr));

    if let Some(dir) = &config.working_dir {
        check_working_dir(dir)?;
        command.current_dir(dunce::simplified(dir));
    }

    let mut child = command.spawn().map_err(|source| ExecutionError::Spawn {
        command: command_line.to_string(),
        source,
    })?;
    lifecycle.advance(RunState::Running);
    log::debug!("Spawned '{}' (PID: {})", command_line, child.id());

    let Streams {
        stdin,
        stdout,
        stderr,
    } = streams;
    if let Some(pipe) = child.stdin.take() {
        feed_input(stdin, pipe);
    }

    let (sender, receiver) = mpsc::channel();
    let mut relay = Relay {
        stdout,
        stderr,
        open: 0,
        error: None,
        abandoned: Arc::new(AtomicBool::new(false)),
    };
    let abandoned = Arc::clone(&relay.abandoned);
    if let Some(pipe) = child.stdout.take() {
        relay.open += spawn_reader(pipe, Channel::Stdout, sender.clone(), &abandoned);
    }
    if let Some(pipe) = child.stderr.take() {
        relay.open += spawn_reader(pipe, Channel::Stderr, sender, &abandoned);
    }

    let status = supervise(
        &mut child,
        command_line,
        cancellation_token,
        &mut relay,
        &receiver,
    )?;

    if !status.success() {
        return Err(ExecutionError::NonZeroExitStatus {
            command: command_line.to_string(),
            status,
        });
    }
    match relay.error {
        Some(source) => Err(ExecutionError::Relay {
            command: command_line.to_string(),
            source,
        }),
        None => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Stdout,
    Stderr,
}

enum Chunk {
    Data(Channel, Vec<u8>),
    Closed(Channel),
    Failed(Channel, io::Error),
}

/// Forwards chunks read from the child's pipes into the caller's sinks.
/// Sinks stay on the launching thread, so a drain can be abandoned at any time.
struct Relay<'a> {
    stdout: &'a mut (dyn Write + Send),
    stderr: &'a mut (dyn Write + Send),
    open: usize,
    error: Option<io::Error>,
    /// Set on the first error; readers then close their pipes.
    abandoned: Arc<AtomicBool>,
}

impl Relay<'_> {
    fn accept(&mut self, chunk: Chunk) {
        match chunk {
            Chunk::Data(channel, bytes) => {
                if self.error.is_some() {
                    return;
                }
                let sink = match channel {
                    Channel::Stdout => &mut *self.stdout,
                    Channel::Stderr => &mut *self.stderr,
                };
                if let Err(e) = sink.write_all(&bytes).and_then(|()| sink.flush()) {
                    log::debug!("Writing child {:?} to the caller failed: {}", channel, e);
                    self.error = Some(e);
                    self.abandoned.store(true, Ordering::SeqCst);
                }
            }
            Chunk::Closed(_) => self.open = self.open.saturating_sub(1),
            Chunk::Failed(channel, e) => {
                log::debug!("Reading child {:?} failed: {}", channel, e);
                self.open = self.open.saturating_sub(1);
                self.error.get_or_insert(e);
                self.abandoned.store(true, Ordering::SeqCst);
            }
        }
    }

    /// Forwards whatever arrives before `deadline`, or until every pipe is closed.
    fn drain_until(&mut self, receiver: &Receiver<Chunk>, deadline: Instant) {
        while self.open > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match receiver.recv_timeout(remaining) {
                Ok(chunk) => self.accept(chunk),
                Err(RecvTimeoutError::Timeout) => {
                    log::debug!("Abandoning {} open output pipe(s).", self.open);
                    return;
                }
                Err(RecvTimeoutError::Disconnected) => self.open = 0,
            }
        }
    }
}

/// Non-blocking wait loop that allows for cancellation.
///
/// Output is forwarded while waiting. After a natural exit the pipes are
/// drained to EOF; once cancelled, they get [`CANCEL_DRAIN_GRACE`] at most,
/// since a grandchild may keep them open indefinitely.
fn supervise(
    child: &mut Child,
    command_line: &str,
    cancellation_token: &CancellationToken,
    relay: &mut Relay<'_>,
    receiver: &Receiver<Chunk>,
) -> Result<ExitStatus, ExecutionError> {
    let mut exited: Option<ExitStatus> = None;
    loop {
        if exited.is_none() {
            match child.try_wait() {
                Ok(status) => exited = status,
                Err(source) => {
                    terminate(child);
                    return Err(ExecutionError::Wait {
                        command: command_line.to_string(),
                        source,
                    });
                }
            }
        }

        if let Some(status) = exited
            && relay.open == 0
        {
            return Ok(status);
        }

        if cancellation_token.load(Ordering::SeqCst) {
            if exited.is_none() {
                log::debug!(
                    "Cancellation requested, killing child process (PID: {})...",
                    child.id()
                );
                terminate(child);
            }
            relay.drain_until(receiver, Instant::now() + CANCEL_DRAIN_GRACE);
            return Err(ExecutionError::Cancelled {
                command: command_line.to_string(),
            });
        }

        if relay.open == 0 {
            thread::sleep(POLL_INTERVAL);
            continue;
        }
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(chunk) => relay.accept(chunk),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => relay.open = 0,
        }
    }
}

/// Reads one child pipe on a detached thread, sending chunks until EOF.
/// Once the relay is abandoned the pipe is dropped, so a child that keeps
/// writing sees a broken pipe. Returns the number of readers started (0 or 1).
fn spawn_reader(
    mut pipe: impl Read + Send + 'static,
    channel: Channel,
    sender: Sender<Chunk>,
    abandoned: &Arc<AtomicBool>,
) -> usize {
    let abandoned = Arc::clone(abandoned);
    let spawned = thread::Builder::new()
        .name(format!("execkit-{:?}", channel).to_lowercase())
        .spawn(move || {
            let mut buffer = [0u8; RELAY_BUFFER_SIZE];
            loop {
                let chunk = match pipe.read(&mut buffer) {
                    Ok(0) => Chunk::Closed(channel),
                    Ok(n) => Chunk::Data(channel, buffer.get(..n).unwrap_or_default().to_vec()),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => Chunk::Failed(channel, e),
                };
                let done = !matches!(chunk, Chunk::Data(..));
                // A closed receiver means the launch gave up on this pipe.
                if sender.send(chunk).is_err() || done {
                    return;
                }
                if abandoned.load(Ordering::SeqCst) {
                    sender.send(Chunk::Closed(channel)).ok();
                    return;
                }
            }
        });
    match spawned {
        Ok(_) => 1,
        Err(e) => {
            log::warn!("Could not start {:?} relay: {}", channel, e);
            0
        }
    }
}

fn terminate(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::warn!("Failed to kill child process {}: {}", child.id(), e);
    }
    // Reap it so no zombie is left behind.
    child.wait().ok();
}

fn check_working_dir(dir: &Path) -> Result<(), ExecutionError> {
    let path = dir.display().to_string();
    let metadata = fs::metadata(dir).map_err(|source| ExecutionError::WorkingDir {
        path: path.clone(),
        source,
    })?;
    if !metadata.is_dir() {
        return Err(ExecutionError::WorkingDir {
            path,
            source: io::Error::new(io::ErrorKind::NotADirectory, "not a directory"),
        });
    }
    Ok(())
}

fn pipe_or_null(relay: bool) -> Stdio {
    if relay { Stdio::piped() } else { Stdio::null() }
}

/// Copies the caller's input into the child on a detached thread.
/// The child's stdin is closed when the source is exhausted.
fn feed_input(mut source: Box<dyn Read + Send>, mut sink: ChildStdin) {
    let spawned = thread::Builder::new()
        .name("execkit-stdin".to_string())
        .spawn(move || {
            if let Err(e) = io::copy(&mut source, &mut sink)
                && e.kind() != io::ErrorKind::BrokenPipe
            {
                log::debug!("Input relay stopped: {}", e);
            }
        });
    if let Err(e) = spawned {
        log::warn!("Could not start input relay: {}", e);
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::{core::options, models::ExecOption};
    use std::time::Duration;

    fn token() -> CancellationToken {
        Arc::new(AtomicBool::new(false))
    }

    /// Runs `positional` with `opts`, returning (result, stdout, stderr).
    fn run(
        positional: &[&str],
        opts: Vec<ExecOption>,
        input: &'static str,
    ) -> (Result<Outcome, ExecutionError>, String, String) {
        let config = options::resolve(opts);
        let positional: Vec<String> = positional.iter().map(|s| s.to_string()).collect();
        let invocation = Invocation::derive(&positional, &config).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(
            &invocation,
            &config,
            &token(),
            Streams::new(Box::new(input.as_bytes()), &mut out, &mut err),
        );
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(err).unwrap(),
        )
    }

    #[test]
    fn test_echo_relays_stdout() {
        let (result, out, err) = run(&["echo", "hi"], vec![], "");
        assert!(matches!(result, Ok(Outcome::Success)));
        assert_eq!(out, "hi\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_stdin_is_relayed_to_child() {
        let (result, out, _) = run(&["cat"], vec![], "piped input");
        assert!(matches!(result, Ok(Outcome::Success)));
        assert_eq!(out, "piped input");
    }

    #[test]
    fn test_shell_mode_interprets_joined_line() {
        let (result, out, _) = run(&["echo hi"], vec![ExecOption::USE_SHELL], "");
        assert!(matches!(result, Ok(Outcome::Success)));
        assert_eq!(out, "hi\n");
    }

    #[test]
    fn test_shell_mode_does_not_quote_arguments() {
        let (result, out, _) = run(
            &["echo", "a;", "echo", "b"],
            vec![ExecOption::USE_SHELL],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(out, "a\nb\n");
    }

    #[test]
    fn test_non_zero_exit_is_a_runtime_failure() {
        let (result, _, _) = run(&["false"], vec![], "");
        let err = result.unwrap_err();
        assert!(matches!(err, ExecutionError::NonZeroExitStatus { .. }));
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.final_state(), RunState::Completed);
    }

    #[test]
    fn test_ignore_errors_suppresses_non_zero_exit() {
        let (result, _, _) = run(&["false"], vec![ExecOption::IGNORE_ERRORS], "");
        let outcome = result.unwrap();
        assert!(matches!(
            outcome.suppressed(),
            Some(ExecutionError::NonZeroExitStatus { .. })
        ));
    }

    #[test]
    fn test_missing_program_is_a_launch_failure() {
        let (result, _, _) = run(&["execkit-no-such-program-xyz"], vec![], "");
        let err = result.unwrap_err();
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert_eq!(err.final_state(), RunState::Failed);
    }

    #[test]
    fn test_ignore_errors_suppresses_launch_failure() {
        let (result, _, _) = run(
            &["execkit-no-such-program-xyz"],
            vec![ExecOption::IGNORE_ERRORS],
            "",
        );
        assert!(matches!(
            result,
            Ok(Outcome::Suppressed(ExecutionError::Spawn { .. }))
        ));
    }

    #[test]
    fn test_quiet_discards_stderr() {
        let (result, out, err) = run(
            &["echo out; echo err >&2"],
            vec![ExecOption::USE_SHELL, ExecOption::QUIET],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(out, "out\n");
        assert!(err.is_empty());
    }

    #[test]
    fn test_stderr_is_relayed_by_default() {
        let (_, _, err) = run(&["echo err >&2"], vec![ExecOption::USE_SHELL], "");
        assert_eq!(err, "err\n");
    }

    /// A sink that rejects every write, like a closed downstream pipe.
    struct ClosedSink;

    impl Write for ClosedSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("sink closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run_into_closed_stdout(opts: Vec<ExecOption>) -> Result<Outcome, ExecutionError> {
        let config = options::resolve(opts);
        let positional = ["echo".to_string(), "hi".to_string()];
        let invocation = Invocation::derive(&positional, &config).unwrap();
        let mut out = ClosedSink;
        let mut err = Vec::new();
        execute(
            &invocation,
            &config,
            &token(),
            Streams::new(Box::new(io::empty()), &mut out, &mut err),
        )
    }

    #[test]
    fn test_failing_output_sink_fails_the_run() {
        let err = run_into_closed_stdout(vec![]).unwrap_err();
        assert!(matches!(err, ExecutionError::Relay { .. }), "Got: {:?}", err);
        assert_eq!(err.kind(), ErrorKind::Runtime);
        assert_eq!(err.final_state(), RunState::Completed);
        assert!(err.to_string().contains("sink closed"), "Error message was: {}", err);
    }

    #[test]
    fn test_ignore_errors_suppresses_failing_output_sink() {
        let outcome = run_into_closed_stdout(vec![ExecOption::IGNORE_ERRORS]).unwrap();
        assert!(matches!(
            outcome.suppressed(),
            Some(ExecutionError::Relay { .. })
        ));
    }

    #[test]
    fn test_writer_into_failing_sink_is_not_kept_alive() {
        // --- Setup ---
        // `yes` never stops on its own; only a closed pipe ends it.
        let config = options::resolve([ExecOption::IGNORE_ERRORS]);
        let invocation = Invocation::derive(&["yes".to_string()], &config).unwrap();
        let mut out = ClosedSink;
        let mut err = Vec::new();

        // --- Execute ---
        let started = Instant::now();
        let result = execute(
            &invocation,
            &config,
            &token(),
            Streams::new(Box::new(io::empty()), &mut out, &mut err),
        );

        // --- Assert ---
        assert!(matches!(result, Ok(Outcome::Suppressed(_))));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_interactive_relays_stderr_despite_quiet() {
        let (_, _, err) = run(
            &["echo err >&2"],
            vec![
                ExecOption::USE_SHELL,
                ExecOption::QUIET,
                ExecOption::INTERACTIVE,
            ],
            "",
        );
        assert_eq!(err, "err\n");
    }

    #[test]
    fn test_no_inherit_env_gives_empty_environment() {
        // Without PATH the lookup falls back to the platform default search path.
        let (result, out, _) = run(&["env"], vec![ExecOption::NO_INHERIT_ENV], "");
        assert!(result.is_ok());
        assert!(out.is_empty(), "Child saw variables: {}", out);
    }

    #[test]
    fn test_env_overrides_later_entry_shadows_earlier() {
        let (result, out, _) = run(
            &["env"],
            vec![
                ExecOption::NO_INHERIT_ENV,
                ExecOption::env("A=1"),
                ExecOption::env("A=2"),
            ],
            "",
        );
        assert!(result.is_ok());
        assert_eq!(out, "A=2\n");
    }

    #[test]
    fn test_working_dir_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let (result, out, _) = run(
            &["pwd"],
            vec![ExecOption::working_dir(dir.path().to_string_lossy())],
            "",
        );
        assert!(result.is_ok());
        let expected = fs::canonicalize(dir.path()).unwrap();
        let actual = fs::canonicalize(out.trim_end()).unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_missing_working_dir_is_a_launch_failure() {
        let (result, _, _) = run(
            &["true"],
            vec![ExecOption::working_dir("/definitely/not/here/execkit")],
            "",
        );
        let err = result.unwrap_err();
        assert!(matches!(err, ExecutionError::WorkingDir { .. }));
        assert_eq!(err.kind(), ErrorKind::Launch);
    }

    #[test]
    fn test_working_dir_that_is_a_file_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let (result, _, _) = run(
            &["true"],
            vec![
                ExecOption::working_dir(file.path().to_string_lossy()),
                ExecOption::IGNORE_ERRORS,
            ],
            "",
        );
        assert!(matches!(
            result,
            Ok(Outcome::Suppressed(ExecutionError::WorkingDir { .. }))
        ));
    }

    #[test]
    fn test_cancellation_kills_child() {
        // --- Setup ---
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let line = format!("echo $$ > {}; exec sleep 30", pid_file.display());
        let config = options::resolve([ExecOption::USE_SHELL, ExecOption::IGNORE_ERRORS]);
        let invocation = Invocation::derive(&[line], &config).unwrap();
        let cancel = token();
        let trigger = Arc::clone(&cancel);
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.store(true, Ordering::SeqCst);
        });

        // --- Execute ---
        let started = Instant::now();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(
            &invocation,
            &config,
            &cancel,
            Streams::new(Box::new(io::empty()), &mut out, &mut err),
        );
        canceller.join().unwrap();

        // --- Assert ---
        // Cancellation is never suppressed, even with IgnoreErrors.
        let err = result.unwrap_err();
        assert!(matches!(err, ExecutionError::Cancelled { .. }));
        assert_eq!(err.final_state(), RunState::Cancelled);
        assert!(started.elapsed() < Duration::from_secs(10));

        let pid = fs::read_to_string(&pid_file).unwrap();
        let alive = StdCommand::new("sh")
            .args(["-c", &format!("kill -0 {}", pid.trim())])
            .stderr(Stdio::null())
            .status()
            .unwrap();
        assert!(!alive.success(), "Child {} is still running", pid.trim());
    }

    #[test]
    fn test_cancellation_does_not_wait_for_grandchild_holding_output() {
        // --- Setup ---
        // Not `exec`: the shell forks `sleep`, which inherits the output pipes
        // and outlives the killed shell.
        let config = options::resolve([ExecOption::USE_SHELL]);
        let invocation = Invocation::derive(&["sleep 8; echo done".to_string()], &config).unwrap();
        let cancel = token();
        let trigger = Arc::clone(&cancel);
        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            trigger.store(true, Ordering::SeqCst);
        });

        // --- Execute ---
        let started = Instant::now();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(
            &invocation,
            &config,
            &cancel,
            Streams::new(Box::new(io::empty()), &mut out, &mut err),
        );
        let elapsed = started.elapsed();
        canceller.join().unwrap();

        // --- Assert ---
        assert!(matches!(result, Err(ExecutionError::Cancelled { .. })));
        assert!(elapsed < Duration::from_secs(3), "Cancellation took {:?}", elapsed);
        assert!(out.is_empty());
    }

    #[test]
    fn test_cancelled_before_start_never_spawns() {
        let config = options::resolve(Vec::<ExecOption>::new());
        let invocation = Invocation::derive(&["true".to_string()], &config).unwrap();
        let cancel = Arc::new(AtomicBool::new(true));
        let mut out = Vec::new();
        let mut err = Vec::new();
        let result = execute(
            &invocation,
            &config,
            &cancel,
            Streams::new(Box::new(io::empty()), &mut out, &mut err),
        );
        assert!(matches!(result, Err(ExecutionError::Cancelled { .. })));
    }
}
