use crate::OutputFormat;
use crate::accumulator::Duration;
use crate::config::Config;
use crate::platform::state_paths;
use crate::state::State;
use anyhow::{Context, Result};

/// Prints saved day totals, newest first.
pub fn list(config: &Config, format: OutputFormat, limit: Option<usize>) -> Result<Vec<Duration>> {
    let paths = state_paths(config.state.state_dir_override.as_ref())?;
    let state = State::load(&paths.state)?;

    let entries: Vec<Duration> = state
        .saved_timers
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .cloned()
        .collect();

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&entries).context("Failed to serialize history")?;
            println!("{}", json);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No saved timers.");
            }
            for entry in &entries {
                println!("{}  {}", entry.day, entry);
            }
        }
    }

    Ok(entries)
}
