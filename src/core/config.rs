//! Dex file discovery and loading.
//!
//! Finds the dex file for a run and decodes it as whichever dialect it is
//! written in.

use std::path::{Path, PathBuf};

use crate::error::{DexError, DexResult};
use crate::{v1, v2};

/// File names searched, in order, when no explicit dex file is given.
pub const CONFIG_FILE_LOCATIONS: &[&str] = &["dex.yaml", "dex.yml", ".dex.yaml", ".dex.yml"];

/// Leading block-path argument that switches lookup to the home directory.
pub const HOME_MARKER: &str = "~~";

/// Environment variable naming an explicit dex file.
pub const DEX_FILE_ENV: &str = "DEX_FILE";

/// Where to look for a dex file.
#[derive(Debug, Clone, Default)]
pub struct ConfigLocator {
    /// Explicit dex file (from `--file` or `DEX_FILE`)
    pub explicit: Option<PathBuf>,

    /// Resolve every candidate relative to this directory instead of the cwd
    pub base_dir: Option<PathBuf>,

    /// Candidate file names searched after the explicit one
    pub candidates: Vec<PathBuf>,
}

impl ConfigLocator {
    /// Locator with the standard candidate list.
    pub fn new(explicit: Option<PathBuf>) -> Self {
        Self {
            explicit,
            base_dir: None,
            candidates: CONFIG_FILE_LOCATIONS.iter().map(PathBuf::from).collect(),
        }
    }

    /// Resolve candidates relative to `dir`.
    #[must_use]
    pub fn relative_to(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Replace the candidate list.
    #[must_use]
    pub fn with_candidates<I, P>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    fn place(&self, path: &Path) -> PathBuf {
        match self.base_dir {
            Some(ref base) => base.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Return the first dex file that exists.
    ///
    /// An explicit file that does not exist is skipped rather than rejected.
    pub fn find(&self) -> DexResult<PathBuf> {
        if let Some(explicit) = self.explicit.as_deref().filter(|p| !p.as_os_str().is_empty()) {
            let path = self.place(explicit);
            if path.is_file() {
                return Ok(path);
            }
            tracing::debug!(path = ?path, "Explicit dex file does not exist, searching defaults");
        }

        for candidate in &self.candidates {
            let path = self.place(candidate);
            if path.is_file() {
                tracing::debug!(path = ?path, "Found dex file");
                return Ok(path);
            }
        }

        Err(DexError::NotFound { searched: self.candidates.clone() })
    }
}

/// Strip a leading [`HOME_MARKER`] from the block path.
///
/// Returns whether it was present.
pub fn take_home_marker(args: &mut Vec<String>) -> bool {
    if args.first().is_some_and(|a| a == HOME_MARKER) {
        args.remove(0);
        true
    } else {
        false
    }
}

/// A decoded dex file in either dialect.
#[derive(Debug, Clone)]
pub enum Dexfile {
    /// Legacy dialect: a bare list of blocks
    V1(v1::DexFile),

    /// Version 2 dialect
    V2(v2::Document),
}

/// Read and decode a dex file.
pub fn load_dexfile(path: &Path) -> DexResult<Dexfile> {
    let content = std::fs::read_to_string(path)?;
    parse_dexfile(&content)
}

/// Decode dex file text, trying the legacy dialect first.
pub fn parse_dexfile(content: &str) -> DexResult<Dexfile> {
    match v1::parse_config(content) {
        Ok(dexfile) => Ok(Dexfile::V1(dexfile)),
        Err(legacy_err) => {
            tracing::debug!(error = %legacy_err, "Not a legacy dex file, trying version 2");
            v2::parse_config(content).map(Dexfile::V2)
        }
    }
}
