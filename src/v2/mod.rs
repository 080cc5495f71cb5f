//! Version 2 dex file dialect.
//!
//! Blocks carry variables, working directories, shells, and structured
//! commands with `[% name %]` templating, loops, and conditions.
//!
//! A run goes: resolve global variables, find the block by path, resolve
//! the block's variables, normalize its commands, execute them.

mod normalize;
mod parser;
mod resolver;
mod runner;
mod schema;
mod template;
mod vars;

use std::io::Write;

pub use normalize::{normalize_command, prepare_block, resolve_for_vars, Command, PreparedBlock};
pub use parser::parse_config;
pub use resolver::{find_block, resolve_path, ResolvedBlock};
pub use runner::{BlockRunner, RunSummary, DIAG_PROGRAM};
pub use schema::{Block, Document, RawCommand, RawForVars, RawVar, Scalar, VarControl};
pub use template::{placeholders, render};
pub use vars::{
    value_from_output, CommandShell, Overlay, ResolvedVar, VarLookup, VarRegistry, VarValue, INDEX_VAR,
    ITER_VAR,
};

use crate::core::{display_menu, OutputStream};
use crate::error::{DexError, DexResult};

/// The only dialect version this module accepts.
pub const SUPPORTED_VERSION: u32 = 2;

/// Shell used when the document does not name one.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Shell arguments used when the document does not give any.
pub const DEFAULT_SHELL_ARGS: &[&str] = &["-c"];

/// Shell for `from-command` snippets and condition tests.
fn document_shell(document: &Document) -> CommandShell {
    CommandShell { program: document.shell.clone(), args: document.shell_args.clone() }
}

/// Build the variable state for `path` and normalize the selected block.
///
/// Global variables resolve first so block variables can override them.
pub fn prepare(document: &Document, path: &[String]) -> DexResult<(VarRegistry, PreparedBlock)> {
    let mut registry = VarRegistry::with_shell(document_shell(document));
    registry.resolve_all(&document.vars);

    let resolved = resolve_path(document, path)?;
    registry.resolve_all(&resolved.block.vars);

    let prepared = prepare_block(&resolved, &registry);
    Ok((registry, prepared))
}

/// Run the block at `path`, sending command output to the given streams.
pub fn run_block(
    document: &Document,
    path: &[String],
    stdout: OutputStream,
    stderr: OutputStream,
) -> DexResult<RunSummary> {
    let (registry, block) = prepare(document, path)?;

    BlockRunner::new(&registry)
        .with_condition_shell(document_shell(document))
        .with_output(stdout, stderr)
        .run_block(&block)
}

/// Show the menu or run the block at `path`.
///
/// Returns `false` when the path did not resolve; the error and the menu are
/// written to `err_out` in that case.
pub fn run(document: &Document, path: &[String], out: &mut dyn Write, err_out: &mut dyn Write) -> DexResult<bool> {
    if path.is_empty() {
        display_menu(out, &document.blocks, 0)?;
        return Ok(true);
    }

    match run_block(document, path, OutputStream::Inherit, OutputStream::Inherit) {
        Ok(summary) => {
            tracing::debug!(?summary, "Block finished");
            Ok(true)
        }
        Err(e @ (DexError::BlockNotFound { .. } | DexError::EmptyPath)) => {
            writeln!(err_out, "Error: {e}\n\nSee the menu:")?;
            display_menu(err_out, &document.blocks, 0)?;
            Ok(false)
        }
        Err(e) => Err(e),
    }
}
