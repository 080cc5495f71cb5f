//! Dex - run named blocks of shell commands from a YAML dex file.
//!
//! With no block path the menu of blocks is printed. Otherwise the block at
//! the path is run and dex exits zero, unless the path does not exist.

use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use dex::core::{load_dexfile, take_home_marker, ConfigLocator, Dexfile, DEX_FILE_ENV};
use dex::{v1, v2};

/// Run named blocks of shell commands declared in a dex file
#[derive(Parser)]
#[command(name = "dex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dex file to use instead of searching for dex.yaml, dex.yml, .dex.yaml, .dex.yml
    #[arg(short, long, value_name = "FILE", env = DEX_FILE_ENV)]
    file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Names leading to the block to run; a leading `~~` looks in your home directory
    #[arg(value_name = "BLOCK", trailing_var_arg = true, allow_hyphen_values = true)]
    path: Vec<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).without_time().with_writer(io::stderr))
        .with(filter)
        .init();

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Find and load the dex file, then show the menu or run the selected block.
///
/// Returns `false` when the block path did not resolve.
fn run(cli: Cli) -> Result<bool> {
    let mut path = cli.path;
    let use_home = take_home_marker(&mut path);

    let mut locator = ConfigLocator::new(cli.file);
    if use_home {
        let home = dirs::home_dir().context("could not determine the home directory")?;
        locator = locator.relative_to(home);
    }

    let filename = locator.find()?;
    tracing::debug!(file = ?filename, "Using dex file");

    let dexfile =
        load_dexfile(&filename).with_context(|| format!("failed to load {}", filename.display()))?;

    let found = match dexfile {
        Dexfile::V1(dexfile) => v1::run(&dexfile, &path, &mut io::stdout(), &mut io::stderr())?,
        Dexfile::V2(document) => v2::run(&document, &path, &mut io::stdout(), &mut io::stderr())?,
    };

    Ok(found)
}
