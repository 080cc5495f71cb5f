//! # Dex
//!
//! Run named blocks of shell commands declared in a YAML dex file.
//!
//! A dex file declares a tree of named, described blocks. Selecting a block
//! by its path of names runs its commands, after substituting `[% name %]`
//! variables into the command text.
//!
//! ## Features
//!
//! - **Variables**: literals, lists, environment lookups, command output, defaults
//! - **Loops**: run a command once per value of a list with `for-vars`
//! - **Conditions**: gate a command on a `test` expression
//! - **Sticky directories**: a command's `dir` carries over to the ones after it
//! - **Legacy files**: plain lists of blocks with shell commands still run
//!
//! ## Quick Start
//!
//! ```bash
//! # Show the menu of blocks
//! dex
//!
//! # Run a nested block
//! dex server restart
//!
//! # Use the dex file in your home directory
//! dex ~~ backup
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod core;
pub mod error;
pub mod v1;
pub mod v2;

// Re-export commonly used types
pub use core::{load_dexfile, parse_dexfile, ConfigLocator, Dexfile};
pub use error::{DexError, DexResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "dex";
