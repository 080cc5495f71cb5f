//! Command execution module.
//!
//! The single place where dex spawns external processes. Every spawn blocks
//! until the child exits.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::process::{Command as ProcessCommand, ExitStatus, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::error::{DexError, DexResult};

/// Exit code reported when a process could not be spawned or was killed by a signal.
pub const SYNTHETIC_FAILURE_CODE: i32 = 1;

/// An in-memory sink that captured process output is appended to.
pub type SharedBuffer = Arc<Mutex<Vec<u8>>>;

/// Where a child's output stream goes.
#[derive(Debug, Clone, Default)]
pub enum OutputStream {
    /// Write straight to this process's own stream.
    #[default]
    Inherit,

    /// Discard the output.
    Null,

    /// Append the output to a shared buffer.
    Capture(SharedBuffer),
}

impl OutputStream {
    /// Create a capturing stream along with the buffer it fills.
    pub fn capture() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Self::Capture(Arc::clone(&buffer)), buffer)
    }

    fn stdio(&self) -> Stdio {
        match self {
            Self::Inherit => Stdio::inherit(),
            Self::Null => Stdio::null(),
            Self::Capture(_) => Stdio::piped(),
        }
    }

    fn buffer(&self) -> Option<SharedBuffer> {
        match self {
            Self::Capture(buffer) => Some(Arc::clone(buffer)),
            Self::Inherit | Self::Null => None,
        }
    }
}

/// Everything needed to spawn one process.
#[derive(Debug, Clone, Default)]
pub struct ExecContext {
    /// Program to run
    pub program: String,

    /// Arguments, in order
    pub args: Vec<String>,

    /// Working directory (inherits ours when unset)
    pub dir: Option<PathBuf>,

    /// Standard output destination
    pub stdout: OutputStream,

    /// Standard error destination
    pub stderr: OutputStream,
}

impl ExecContext {
    /// Create a context for a program with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into(), ..Self::default() }
    }

    /// Append arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    #[must_use]
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    /// Set both output streams.
    #[must_use]
    pub fn with_output(mut self, stdout: OutputStream, stderr: OutputStream) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }
}

/// Result of executing a command.
#[derive(Debug)]
pub struct ExecutionResult {
    /// Exit status of the command
    pub status: ExitStatus,

    /// Time taken to execute
    pub duration: Duration,
}

impl ExecutionResult {
    /// Check if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.status.success()
    }

    /// Get the exit code, mapping signal deaths to a synthetic failure.
    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(SYNTHETIC_FAILURE_CODE)
    }
}

/// Command executor.
#[derive(Debug, Default, Clone, Copy)]
pub struct Executor;

impl Executor {
    /// Create a new executor.
    pub fn new() -> Self {
        Self
    }

    /// Spawn the process described by `ctx` and wait for it to exit.
    ///
    /// Captured streams are drained while the child runs so a chatty process
    /// cannot fill its pipe and stall.
    pub fn execute(&self, ctx: &ExecContext) -> DexResult<ExecutionResult> {
        let start = Instant::now();

        let mut cmd = ProcessCommand::new(&ctx.program);
        cmd.args(&ctx.args);

        if let Some(ref dir) = ctx.dir {
            cmd.current_dir(dir);
        }

        cmd.stdin(Stdio::inherit());
        cmd.stdout(ctx.stdout.stdio());
        cmd.stderr(ctx.stderr.stdio());

        tracing::debug!(program = %ctx.program, args = ?ctx.args, dir = ?ctx.dir, "Spawning process");

        let mut child = cmd
            .spawn()
            .map_err(|source| DexError::Spawn { program: ctx.program.clone(), source })?;

        // Drain stdout on a helper thread while stderr is read here
        let stdout_pump = match (child.stdout.take(), ctx.stdout.buffer()) {
            (Some(stdout), Some(buffer)) => Some(std::thread::spawn(move || pump(stdout, &buffer))),
            _ => None,
        };

        if let (Some(stderr), Some(buffer)) = (child.stderr.take(), ctx.stderr.buffer()) {
            pump(stderr, &buffer);
        }

        if let Some(handle) = stdout_pump {
            let _ = handle.join();
        }

        let status = child.wait()?;

        Ok(ExecutionResult { status, duration: start.elapsed() })
    }

    /// Run a process and reduce the outcome to an exit code.
    ///
    /// Spawn failures and abnormal terminations become
    /// [`SYNTHETIC_FAILURE_CODE`].
    pub fn status(&self, ctx: &ExecContext) -> i32 {
        match self.execute(ctx) {
            Ok(result) => result.code(),
            Err(e) => {
                tracing::debug!(error = %e, "Process did not run");
                SYNTHETIC_FAILURE_CODE
            }
        }
    }
}

/// Copy a child's pipe into a shared buffer until EOF.
fn pump(mut source: impl Read, buffer: &SharedBuffer) {
    let mut chunk = [0_u8; 8192];
    loop {
        match source.read(&mut chunk) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let _ = buffer.lock().write_all(&chunk[..n]);
            }
        }
    }
}
