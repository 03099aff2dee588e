//! Resolving and entering the launcher directory.
//!
//! Relative paths (the log file, `src/main.py`, `launcher.toml`) resolve
//! against the directory holding the launcher, not wherever it was started from.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Directory the launcher operates in.
///
/// `override_dir` (from `--dir`) wins; otherwise the directory containing the
/// running executable.
pub fn launcher_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir
            .canonicalize()
            .with_context(|| format!("resolve launcher dir {}", dir.display()))?,
        None => {
            let exe = env::current_exe().context("locate launcher executable")?;
            let exe = exe
                .canonicalize()
                .with_context(|| format!("resolve {}", exe.display()))?;
            exe.parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| anyhow!("executable {} has no parent dir", exe.display()))?
        }
    };
    if !dir.is_dir() {
        return Err(anyhow!("launcher dir {} is not a directory", dir.display()));
    }
    Ok(dir)
}

/// Make `dir` the process working directory.
pub fn enter(dir: &Path) -> Result<()> {
    env::set_current_dir(dir).with_context(|| format!("enter {}", dir.display()))?;
    debug!(dir = %dir.display(), "working directory set");
    Ok(())
}
