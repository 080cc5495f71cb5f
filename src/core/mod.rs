//! Core plumbing shared by both dex file dialects: process spawning,
//! dex file discovery and loading, and the block menu.

mod config;
mod executor;
mod menu;

pub use config::{
    load_dexfile, parse_dexfile, take_home_marker, ConfigLocator, Dexfile, CONFIG_FILE_LOCATIONS,
    DEX_FILE_ENV, HOME_MARKER,
};
pub use executor::{
    ExecContext, ExecutionResult, Executor, OutputStream, SharedBuffer, SYNTHETIC_FAILURE_CODE,
};
pub use menu::{display_menu, MenuEntry};
