//! Block execution engine.
//!
//! Runs a prepared block's commands strictly in order. For each command:
//! condition gate, sticky directory update, then one pass per `for-vars`
//! value running `diag` and `exec`. Failures are logged and execution
//! moves on.

use std::path::PathBuf;

use super::normalize::{Command, PreparedBlock};
use super::template::render;
use super::vars::{CommandShell, VarRegistry};
use crate::core::{ExecContext, Executor, OutputStream};
use crate::error::{DexError, DexResult};

/// Program used to announce `diag` text.
pub const DIAG_PROGRAM: &str = "echo";

/// Outcome counts for one block run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Commands skipped by their condition
    pub skipped: usize,

    /// Processes that ran and exited zero
    pub succeeded: usize,

    /// Processes that failed to start or exited non-zero
    pub failed: usize,
}

/// Runs prepared blocks against a variable registry.
#[derive(Debug)]
pub struct BlockRunner<'a> {
    /// Variables visible to every command
    registry: &'a VarRegistry,

    /// Shell used for condition tests
    condition_shell: CommandShell,

    /// Where command output goes
    stdout: OutputStream,
    stderr: OutputStream,

    executor: Executor,
}

impl<'a> BlockRunner<'a> {
    /// Create a runner that forwards output to our own streams.
    pub fn new(registry: &'a VarRegistry) -> Self {
        Self {
            registry,
            condition_shell: CommandShell::default(),
            stdout: OutputStream::Inherit,
            stderr: OutputStream::Inherit,
            executor: Executor::new(),
        }
    }

    /// Redirect command output.
    #[must_use]
    pub fn with_output(mut self, stdout: OutputStream, stderr: OutputStream) -> Self {
        self.stdout = stdout;
        self.stderr = stderr;
        self
    }

    /// Use a different shell for condition tests.
    #[must_use]
    pub fn with_condition_shell(mut self, shell: CommandShell) -> Self {
        self.condition_shell = shell;
        self
    }

    /// Run every command of a block.
    ///
    /// The first command starts in the block's rendered directory, or the
    /// current directory when the block has none.
    pub fn run_block(&self, block: &PreparedBlock) -> DexResult<RunSummary> {
        let start_dir = match render(&block.dir, self.registry) {
            dir if dir.is_empty() => std::env::current_dir().map_err(DexError::CurrentDir)?,
            dir => PathBuf::from(dir),
        };

        tracing::debug!(block = %block.name, dir = ?start_dir, "Running block");

        Ok(self.run_commands(&block.commands, start_dir))
    }

    /// Run commands in order starting from `cwd`.
    pub fn run_commands(&self, commands: &[Command], mut cwd: PathBuf) -> RunSummary {
        let mut summary = RunSummary::default();

        for command in commands {
            if !self.condition_holds(command) {
                tracing::debug!(condition = %command.condition, "Skipping command (condition not met)");
                summary.skipped += 1;
                continue;
            }

            let dir = render(&command.dir, self.registry);
            if !dir.is_empty() {
                cwd = PathBuf::from(dir);
            }

            for (index, value) in command.for_vars.iter().enumerate() {
                let overlay = self.registry.overlay(index, value);

                if !command.diag.is_empty() {
                    let ctx = self.context(DIAG_PROGRAM, &cwd).args([render(&command.diag, &overlay)]);
                    self.spawn(&ctx, &mut summary);
                }

                if !command.exec.is_empty() {
                    let ctx = self
                        .context(&command.shell, &cwd)
                        .args(command.shell_args.iter().cloned())
                        .args([render(&command.exec, &overlay)]);
                    self.spawn(&ctx, &mut summary);
                }
            }
        }

        summary
    }

    /// Evaluate a command's condition as `test <rendered>`.
    ///
    /// Iteration variables are not bound yet at this point. A command without
    /// a condition always runs.
    pub fn condition_holds(&self, command: &Command) -> bool {
        if command.condition.is_empty() {
            return true;
        }

        let test = format!("test {}", render(&command.condition, self.registry));
        let ctx = ExecContext::new(&self.condition_shell.program)
            .args(self.condition_shell.args.iter().cloned())
            .args([test])
            .with_output(OutputStream::Null, OutputStream::Null);

        self.executor.status(&ctx) == 0
    }

    fn context(&self, program: &str, cwd: &std::path::Path) -> ExecContext {
        ExecContext::new(program).with_dir(cwd).with_output(self.stdout.clone(), self.stderr.clone())
    }

    fn spawn(&self, ctx: &ExecContext, summary: &mut RunSummary) {
        match self.executor.execute(ctx) {
            Ok(result) if result.success() => summary.succeeded += 1,
            Ok(result) => {
                summary.failed += 1;
                let err = DexError::ExitStatus { program: ctx.program.clone(), code: result.code() };
                tracing::warn!(args = ?ctx.args, "{err}");
            }
            Err(err) => {
                summary.failed += 1;
                tracing::warn!(args = ?ctx.args, "{err}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::core::SharedBuffer;
    use crate::v2::vars::ResolvedVar;

    fn command(exec: &str) -> Command {
        Command {
            exec: exec.to_string(),
            shell: "/bin/bash".to_string(),
            shell_args: vec!["-c".to_string()],
            for_vars: vec!["1".to_string()],
            ..Command::default()
        }
    }

    fn run(registry: &VarRegistry, commands: &[Command], cwd: &Path) -> (RunSummary, String) {
        let (stream, buffer) = OutputStream::capture();
        let runner = BlockRunner::new(registry).with_output(stream.clone(), stream);

        let summary = runner.run_commands(commands, cwd.to_path_buf());
        (summary, captured(&buffer))
    }

    fn captured(buffer: &SharedBuffer) -> String {
        String::from_utf8_lossy(&buffer.lock()).to_string()
    }

    #[test]
    fn test_exec_renders_variables() {
        let mut registry = VarRegistry::new();
        registry.insert("string_var", ResolvedVar::scalar("hi there"));

        let (summary, out) = run(&registry, &[command("echo \"[%string_var%]\"")], Path::new("/"));

        assert_eq!(out, "hi there\n");
        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn test_for_vars_binds_index_and_value() {
        let mut cmd = command("echo [% index %] [% var %]");
        cmd.for_vars = vec!["one".to_string(), "two".to_string(), "three".to_string()];

        let (summary, out) = run(&VarRegistry::new(), &[cmd], Path::new("/"));

        assert_eq!(out, "0 one\n1 two\n2 three\n");
        assert_eq!(summary.succeeded, 3);
    }

    #[test]
    fn test_empty_for_vars_runs_nothing() {
        let mut cmd = command("echo never");
        cmd.for_vars = Vec::new();

        let (summary, out) = run(&VarRegistry::new(), &[cmd], Path::new("/"));

        assert_eq!(out, "");
        assert_eq!(summary, RunSummary::default());
    }

    #[test]
    fn test_diag_and_exec_both_run() {
        let mut registry = VarRegistry::new();
        registry.insert("who", ResolvedVar::scalar("world"));

        let mut cmd = command("echo hello [% who %]");
        cmd.diag = "about to greet [% who %] ([% index %])".to_string();

        let (_, out) = run(&registry, &[cmd], Path::new("/"));

        assert_eq!(out, "about to greet world (0)\nhello world\n");
    }

    #[test]
    fn test_condition_gate() {
        let mut registry = VarRegistry::new();
        registry.insert("conditionVal", ResolvedVar::scalar("1"));

        let mut yes = command("echo condition true");
        yes.condition = "1 -eq [% conditionVal %]".to_string();
        let mut no = command("echo condition false");
        no.condition = "1 -eq 0".to_string();
        no.diag = "never announced".to_string();

        let (summary, out) = run(&registry, &[yes, no], Path::new("/"));

        assert_eq!(out, "condition true\n");
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_condition_does_not_see_iteration_values() {
        let mut cmd = command("echo ran");
        cmd.condition = "-n \"[% var %]\"".to_string();
        cmd.for_vars = vec!["value".to_string()];

        let (summary, out) = run(&VarRegistry::new(), &[cmd], Path::new("/"));

        assert_eq!(out, "");
        assert_eq!(summary.skipped, 1);
    }

    #[test]
    fn test_sticky_directory() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();
        let nested = root.join("nested");
        std::fs::create_dir(&nested).unwrap();

        let mut registry = VarRegistry::new();
        registry.insert("start_dir", ResolvedVar::scalar(nested.to_str().unwrap()));

        let mut first = command("pwd");
        first.dir = root.to_str().unwrap().to_string();
        let second = command("pwd");
        let mut third = command("pwd");
        third.dir = "[% start_dir %]".to_string();
        let mut fourth = command("pwd");
        fourth.dir = "[% unset %]".to_string();

        let (_, out) = run(&registry, &[first, second, third, fourth], &nested);

        let expected = format!(
            "{root}\n{root}\n{nested}\n{nested}\n",
            root = root.display(),
            nested = nested.display()
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_failures_do_not_stop_the_block() {
        let missing_shell = Command { shell: "/definitely/not/a/shell".to_string(), ..command("echo lost") };

        let (summary, out) =
            run(&VarRegistry::new(), &[command("exit 3"), missing_shell, command("echo after")], Path::new("/"));

        assert_eq!(out, "after\n");
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.succeeded, 1);
    }

    #[test]
    fn test_run_block_uses_block_dir() {
        let temp = tempfile::TempDir::new().unwrap();
        let root = temp.path().canonicalize().unwrap();

        let mut registry = VarRegistry::new();
        registry.insert("root", ResolvedVar::scalar(root.to_str().unwrap()));

        let block = PreparedBlock {
            name: "where".to_string(),
            dir: "[% root %]".to_string(),
            commands: vec![command("pwd")],
        };

        let (stream, buffer) = OutputStream::capture();
        let runner = BlockRunner::new(&registry).with_output(stream.clone(), stream);
        runner.run_block(&block).unwrap();

        assert_eq!(captured(&buffer), format!("{}\n", root.display()));
    }
}
