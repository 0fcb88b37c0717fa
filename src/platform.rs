//! Cross-platform directory resolution for the tally's state files.
//!
//! The state directory is chosen through a fallback chain so the tool keeps
//! working when the home directory is read-only or missing.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".daytally";

/// Get the state directory with cross-platform fallback chain.
///
/// Priority order:
/// 1. Explicit override (for testing/CI)
/// 2. Home directory (~/.daytally)
/// 3. Platform-specific data directory (XDG on Linux, AppData on Windows)
/// 4. Current working directory (last resort)
pub fn get_state_dir(override_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        ensure_writable(dir)?;
        return Ok(dir.clone());
    }

    if let Some(home) = home::home_dir() {
        let dir = home.join(APP_DIR);
        if ensure_writable(&dir).is_ok() {
            return Ok(dir);
        }
        tracing::warn!(
            dir = %dir.display(),
            "cannot write to home state directory, trying fallback locations"
        );
    }

    if let Some(data) = dirs::data_local_dir() {
        let dir = data.join("daytally");
        if ensure_writable(&dir).is_ok() {
            return Ok(dir);
        }
    }

    let dir = PathBuf::from(APP_DIR);
    ensure_writable(&dir).context(
        "Cannot create state directory in any location. \
         Check file permissions or set state.state_dir_override in config.",
    )?;
    Ok(dir)
}

/// Ensure a directory exists and is writable by the current user.
pub fn ensure_writable(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

    let test_path = dir.join(".write_test");
    fs::write(&test_path, b"test")
        .with_context(|| format!("Directory {} is not writable", dir.display()))?;

    // Ignore cleanup errors (file might be held by antivirus on Windows)
    let _ = fs::remove_file(&test_path);

    Ok(())
}

/// Location of the config file, `~/.daytally/config.toml`.
pub fn config_path() -> Result<PathBuf> {
    let home = home::home_dir().context("Could not find home directory")?;
    Ok(home.join(APP_DIR).join("config.toml"))
}

/// Files that make up one tally's persisted state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatePaths {
    /// Guards read-modify-write of `state`.
    pub lock: PathBuf,
    pub state: PathBuf,
    /// Held for as long as a ticker is running.
    pub ticker: PathBuf,
}

impl StatePaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            lock: dir.join("state.lock"),
            state: dir.join("state.json"),
            ticker: dir.join("ticker.lock"),
        }
    }
}

/// Get the state file paths, respecting config overrides.
pub fn state_paths(state_dir_override: Option<&PathBuf>) -> Result<StatePaths> {
    let state_dir = get_state_dir(state_dir_override)?;
    Ok(StatePaths::in_dir(&state_dir))
}
