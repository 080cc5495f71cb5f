//! Error types for dex.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for dex operations.
pub type DexResult<T> = Result<T, DexError>;

/// Errors that can occur while loading, resolving, or running a dex file.
///
/// Only the configuration and resolution variants abort a run. The others
/// are logged where they happen and execution carries on.
#[derive(Debug, Error)]
pub enum DexError {
    /// No dex file exists at any of the searched locations.
    #[error("no dex file was found. Searched {searched:?}")]
    NotFound { searched: Vec<PathBuf> },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The dex file is not valid YAML for the dialect.
    #[error("invalid dex file: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The document declares a version this engine does not understand.
    #[error("incorrect version number: expected 2, found {0}")]
    UnsupportedVersion(u32),

    /// A block path with no segments was asked for.
    #[error("no block path was given")]
    EmptyPath,

    /// A segment of the block path matched nothing at its level.
    #[error("No commands were found at [{}] (no block named '{segment}')", .path.join(" "))]
    BlockNotFound { segment: String, path: Vec<String> },

    /// A variable entry has a shape other than scalar, list, integer, or control object.
    #[error("variable '{name}' has an unsupported type and was left unset")]
    UnsupportedVariable { name: String },

    /// A `for-vars` entry is neither a list nor a variable name.
    #[error("for-vars has an unsupported type ({found}); the command will not run")]
    UnsupportedIteration { found: String },

    /// A process could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// A process ran but did not exit cleanly.
    #[error("'{program}' exited with status {code}")]
    ExitStatus { program: String, code: i32 },

    /// The process working directory could not be determined.
    #[error("cannot get current working directory: {0}")]
    CurrentDir(#[source] std::io::Error),
}

impl DexError {
    /// Whether this error should stop the run.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::Io(_)
                | Self::Parse(_)
                | Self::UnsupportedVersion(_)
                | Self::EmptyPath
                | Self::BlockNotFound { .. }
                | Self::CurrentDir(_)
        )
    }
}
