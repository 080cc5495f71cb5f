//! Block path resolution.
//!
//! Walks the block tree one path segment per level. The first block whose
//! name matches exactly wins; sibling names are not required to be unique.

use super::{Block, Document};
use crate::error::{DexError, DexResult};

/// A block found by path, with the settings it inherits.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlock<'a> {
    /// The block itself
    pub block: &'a Block,

    /// Shell program for its commands
    pub shell: String,

    /// Shell arguments for its commands
    pub shell_args: Vec<String>,

    /// Working directory template (empty means the process cwd)
    pub dir: String,
}

/// Settings carried down the tree while walking.
#[derive(Debug, Clone)]
struct Inherited {
    shell: String,
    shell_args: Vec<String>,
    dir: String,
}

impl Inherited {
    fn apply(&self, block: &Block) -> Self {
        Self {
            shell: if block.shell.is_empty() { self.shell.clone() } else { block.shell.clone() },
            shell_args: if block.shell_args.is_empty() {
                self.shell_args.clone()
            } else {
                block.shell_args.clone()
            },
            dir: if block.dir.is_empty() { self.dir.clone() } else { block.dir.clone() },
        }
    }
}

/// Find the block at `path` among `blocks`.
pub fn find_block<'a>(blocks: &'a [Block], path: &[String]) -> DexResult<&'a Block> {
    let (first, rest) = path.split_first().ok_or(DexError::EmptyPath)?;

    let block = blocks
        .iter()
        .find(|b| &b.name == first)
        .ok_or_else(|| DexError::BlockNotFound { segment: first.clone(), path: path.to_vec() })?;

    if rest.is_empty() {
        Ok(block)
    } else {
        find_block(&block.children, rest)
    }
}

/// Resolve `path` from the document root, applying inherited shell and
/// directory settings from every ancestor on the way down.
pub fn resolve_path<'a>(document: &'a Document, path: &[String]) -> DexResult<ResolvedBlock<'a>> {
    let root = Inherited {
        shell: document.shell.clone(),
        shell_args: document.shell_args.clone(),
        dir: String::new(),
    };

    let mut blocks = document.blocks.as_slice();
    let mut inherited = root;
    let mut found = None;

    for (depth, segment) in path.iter().enumerate() {
        let block = find_block(blocks, std::slice::from_ref(segment)).map_err(|_| {
            DexError::BlockNotFound { segment: segment.clone(), path: path.to_vec() }
        })?;

        tracing::debug!(depth = depth, block = %block.name, "Matched path segment");

        inherited = inherited.apply(block);
        blocks = &block.children;
        found = Some(block);
    }

    let block = found.ok_or(DexError::EmptyPath)?;

    Ok(ResolvedBlock { block, shell: inherited.shell, shell_args: inherited.shell_args, dir: inherited.dir })
}
