use crate::accumulator::{Duration, History};
use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct State {
    pub version: String,
    #[serde(rename = "activeTimer", default)]
    pub active_timer: Option<Duration>,
    #[serde(rename = "savedTimers", default)]
    pub saved_timers: History,
    /// Set while a ticker should keep advancing the active timer.
    #[serde(default)]
    pub running: bool,
    /// A reset or stale-day start is waiting for save, dismiss or cancel.
    #[serde(default)]
    pub awaiting_decision: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            version: "1.0.0".to_string(),
            active_timer: None,
            saved_timers: History::default(),
            running: false,
            awaiting_decision: false,
        }
    }
}

impl State {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).context("Failed to read state file")?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_json::from_str(&content).context("Failed to parse state JSON")
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize state")?;

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write then rename so a ticker killed mid-write never leaves half a file.
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }
}

fn open_lock_file(lock_path: &Path) -> Result<File> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(true)
        .open(lock_path)
        .context("Failed to open lock file")
}

pub fn with_state_lock<F, R>(lock_path: &Path, state_path: &Path, f: F) -> Result<R>
where
    F: FnOnce(&mut State) -> Result<R>,
{
    let file = open_lock_file(lock_path)?;
    file.lock_exclusive().context("Failed to acquire lock")?;

    let mut state = State::load(state_path)?;

    let result = f(&mut state);

    if result.is_ok() {
        state.save(state_path)?;
    }

    file.unlock().context("Failed to unlock")?;

    result
}

/// Exclusive claim on the single tick source for a state directory.
///
/// Released when dropped, including when the holding process dies.
#[derive(Debug)]
pub struct TickerGuard {
    file: File,
}

impl TickerGuard {
    /// Returns `None` when another ticker already holds the lock.
    pub fn try_acquire(lock_path: &Path) -> Result<Option<Self>> {
        let file = open_lock_file(lock_path)?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { file })),
            Err(e) if e.kind() == fs2::lock_contended_error().kind() => Ok(None),
            Err(e) => Err(e).context("Failed to acquire ticker lock"),
        }
    }
}

impl Drop for TickerGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
