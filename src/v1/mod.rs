//! Legacy dex file dialect.
//!
//! A bare list of named blocks, each holding plain shell command strings.
//! No variables, templating, conditions, or loops.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::core::{display_menu, ExecContext, Executor, MenuEntry, OutputStream};
use crate::error::{DexError, DexResult};
use crate::v2::DEFAULT_SHELL;

/// A legacy dex file.
pub type DexFile = Vec<Block>;

/// A legacy block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Name used to select the block
    pub name: String,

    /// Menu description
    #[serde(default)]
    pub desc: String,

    /// Commands, each run with the default shell
    #[serde(default, rename = "shell")]
    pub commands: Vec<String>,

    /// Nested blocks
    #[serde(default)]
    pub children: Vec<Block>,
}

impl MenuEntry for Block {
    fn name(&self) -> &str {
        &self.name
    }

    fn desc(&self) -> &str {
        &self.desc
    }

    fn children(&self) -> &[Self] {
        &self.children
    }
}

/// Decode a legacy dex file.
pub fn parse_config(content: &str) -> DexResult<DexFile> {
    Ok(serde_yaml::from_str(content)?)
}

/// Find the commands of the block at `path`.
pub fn resolve_block<'a>(blocks: &'a [Block], path: &[String]) -> DexResult<&'a Block> {
    let (first, rest) = path.split_first().ok_or(DexError::EmptyPath)?;

    let block = blocks.iter().find(|b| &b.name == first).ok_or_else(|| DexError::BlockNotFound {
        segment: first.clone(),
        path: path.to_vec(),
    })?;

    if rest.is_empty() {
        Ok(block)
    } else {
        resolve_block(&block.children, rest).map_err(|e| match e {
            DexError::BlockNotFound { segment, .. } => {
                DexError::BlockNotFound { segment, path: path.to_vec() }
            }
            other => other,
        })
    }
}

/// Run each command of a block in order, logging failures and carrying on.
pub fn run_commands(commands: &[String], stdout: &OutputStream, stderr: &OutputStream) {
    let executor = Executor::new();

    for command in commands {
        let ctx = ExecContext::new(DEFAULT_SHELL)
            .args(["-c", command.as_str()])
            .with_output(stdout.clone(), stderr.clone());

        match executor.execute(&ctx) {
            Ok(result) if !result.success() => {
                let err = DexError::ExitStatus { program: ctx.program.clone(), code: result.code() };
                tracing::warn!(command = %command, "{err}");
            }
            Ok(_) => {}
            Err(err) => tracing::warn!(command = %command, "{err}"),
        }
    }
}

/// Show the menu or run the block at `path`.
///
/// Returns `false` when the path did not resolve; the error and the menu are
/// written to `err_out` in that case.
pub fn run(dexfile: &DexFile, path: &[String], out: &mut dyn Write, err_out: &mut dyn Write) -> DexResult<bool> {
    if path.is_empty() {
        display_menu(out, dexfile, 0)?;
        return Ok(true);
    }

    match resolve_block(dexfile, path) {
        Ok(block) => {
            run_commands(&block.commands, &OutputStream::Inherit, &OutputStream::Inherit);
            Ok(true)
        }
        Err(e) => {
            writeln!(err_out, "Error: {e}\n\nSee the menu:")?;
            display_menu(err_out, dexfile, 0)?;
            Ok(false)
        }
    }
}
