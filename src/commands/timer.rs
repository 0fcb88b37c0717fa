use crate::OutputFormat;
use crate::accumulator::{DayKey, Duration, Reconciliation, reconcile_day};
use crate::config::Config;
use crate::platform::{StatePaths, state_paths};
use crate::state::with_state_lock;
use crate::ticker::{TickerExit, TickerOptions, is_ticker_alive, request_pause, run_ticker};
use crate::utils::clock::Clock;
use anyhow::{Context, Result};
use serde::Serialize;
use std::io::{self, Write};
use tracing::{info, warn};

fn paths(config: &Config) -> Result<StatePaths> {
    state_paths(config.state.state_dir_override.as_ref())
}

fn print_decision_prompt() {
    println!("Do you want to save the timer's progress?");
    println!("  daytally save     add it to the history");
    println!("  daytally dismiss  discard it");
    println!("  daytally cancel   keep it and go back");
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    /// A save/dismiss/cancel decision must be made first.
    AwaitingDecision,
    /// The active timer was recorded on an earlier day and was not resumed.
    StaleDay { day: DayKey },
    Ran(TickerExit),
}

/// Runs the timer in the foreground, creating today's timer if none exists.
pub async fn start(
    config: &Config,
    clock: &dyn Clock,
    max_ticks: Option<u64>,
) -> Result<StartOutcome> {
    let paths = paths(config)?;
    let today = clock.day_key();

    let blocked = with_state_lock(&paths.lock, &paths.state, |state| {
        if state.awaiting_decision {
            return Ok(Some(StartOutcome::AwaitingDecision));
        }
        match &state.active_timer {
            None => {
                state.active_timer = Some(Duration::zero(today.clone()));
                Ok(None)
            }
            Some(active) if active.day != today => {
                let day = active.day.clone();
                state.running = false;
                state.awaiting_decision = true;
                Ok(Some(StartOutcome::StaleDay { day }))
            }
            Some(_) => Ok(None),
        }
    })?;

    match blocked {
        Some(StartOutcome::StaleDay { day }) => {
            warn!(%day, %today, "active timer belongs to another day");
            println!("The active timer was started on {}, not today ({}).", day, today);
            print_decision_prompt();
            return Ok(StartOutcome::StaleDay { day });
        }
        Some(outcome) => {
            println!("A decision is pending for the active timer.");
            print_decision_prompt();
            return Ok(outcome);
        }
        None => {}
    }

    let options = TickerOptions {
        interval: std::time::Duration::from_millis(config.timer.tick_interval_ms),
        max_ticks,
    };

    println!("Timer running. Press Ctrl-C or run 'daytally pause' to pause.");
    let exit = run_ticker(&paths, &options, |current| {
        print!("\r{}", current);
        let _ = io::stdout().flush();
    })
    .await?;
    println!();

    match exit {
        TickerExit::AlreadyRunning => println!("Timer is already running."),
        TickerExit::Resumed => println!("✓ Timer resumed in the running session."),
        TickerExit::Paused | TickerExit::Interrupted | TickerExit::LimitReached => {
            println!("✓ Timer paused.")
        }
        TickerExit::Cleared => println!("Timer was saved or dismissed."),
    }

    Ok(StartOutcome::Ran(exit))
}

/// Returns whether a live ticker was advancing the timer.
pub fn pause(config: &Config) -> Result<bool> {
    let paths = paths(config)?;
    let was_running = request_pause(&paths)?;

    if was_running {
        println!("✓ Timer paused.");
    } else {
        println!("No running timer.");
    }
    Ok(was_running)
}

/// Pauses the timer and asks what to do with its progress.
///
/// Returns `false` when there is no active timer.
pub fn reset(config: &Config) -> Result<bool> {
    let paths = paths(config)?;

    let active = with_state_lock(&paths.lock, &paths.state, |state| {
        if state.active_timer.is_some() {
            state.running = false;
            state.awaiting_decision = true;
        }
        Ok(state.active_timer.clone())
    })?;

    match active {
        Some(active) => {
            println!("Timer paused at {}.", active);
            print_decision_prompt();
            Ok(true)
        }
        None => {
            println!("No active timer to reset.");
            Ok(false)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NothingToSave,
    Saved(Reconciliation),
}

/// Reconciles the active timer into history.
///
/// A rejected merge keeps the active timer and the pending decision so the
/// recorded time is not lost.
pub fn save(config: &Config) -> Result<SaveOutcome> {
    let paths = paths(config)?;
    let boundary = config.timer.day_boundary;

    let (outcome, active, head) = with_state_lock(&paths.lock, &paths.state, |state| {
        let Some(active) = state.active_timer.clone() else {
            state.awaiting_decision = false;
            return Ok((SaveOutcome::NothingToSave, None, None));
        };
        state.running = false;

        let history = std::mem::take(&mut state.saved_timers);
        let (history, reconciliation) = reconcile_day(&active, history, boundary);
        state.saved_timers = history;

        if !matches!(reconciliation, Reconciliation::Rejected(_)) {
            state.active_timer = None;
            state.awaiting_decision = false;
        }
        let head = state.saved_timers.head().cloned();
        Ok((SaveOutcome::Saved(reconciliation), Some(active), head))
    })?;

    let (Some(active), SaveOutcome::Saved(reconciliation)) = (&active, &outcome) else {
        println!("No active timer to save.");
        return Ok(outcome);
    };

    match reconciliation {
        Reconciliation::Rejected(err) => {
            eprintln!("✗ Could not save timer: {}", err);
            eprintln!("  The timer was kept. Run 'daytally dismiss' to discard it.");
        }
        Reconciliation::NewDay { previous } => {
            println!(
                "{} is a new day (last entry: {}); starting a new history entry.",
                active.day, previous
            );
            println!("✓ Saved {} for {}.", active, active.day);
        }
        Reconciliation::Started | Reconciliation::Merged => {
            let total = head.context("History is empty after saving")?;
            info!(day = %total.day, %total, "timer saved");
            println!("✓ Saved {} for {} (day total {}).", active, total.day, total);
        }
    }

    Ok(outcome)
}

/// Discards the active timer without saving. Returns whether there was one.
pub fn dismiss(config: &Config) -> Result<bool> {
    let paths = paths(config)?;

    let dropped = with_state_lock(&paths.lock, &paths.state, |state| {
        state.running = false;
        state.awaiting_decision = false;
        Ok(state.active_timer.take())
    })?;

    match dropped {
        Some(active) => {
            info!(day = %active.day, %active, "timer dismissed");
            println!("✓ Discarded {} for {}.", active, active.day);
            Ok(true)
        }
        None => {
            println!("No active timer to dismiss.");
            Ok(false)
        }
    }
}

/// Closes the pending decision and keeps the active timer as it is.
pub fn cancel(config: &Config) -> Result<()> {
    let paths = paths(config)?;

    with_state_lock(&paths.lock, &paths.state, |state| {
        state.awaiting_decision = false;
        Ok(())
    })?;

    println!("Kept the active timer.");
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub active: Option<Duration>,
    pub running: bool,
    pub awaiting_decision: bool,
}

/// Reports the active timer. `running` is only true while a ticker is alive.
pub fn status(config: &Config, format: OutputFormat) -> Result<StatusReport> {
    let paths = paths(config)?;
    let report = with_state_lock(&paths.lock, &paths.state, |state| {
        Ok(StatusReport {
            running: state.running && is_ticker_alive(&paths)?,
            awaiting_decision: state.awaiting_decision,
            active: state.active_timer.clone(),
        })
    })?;

    match format {
        OutputFormat::Json => {
            let json =
                serde_json::to_string_pretty(&report).context("Failed to serialize status")?;
            println!("{}", json);
        }
        OutputFormat::Text => match &report.active {
            Some(active) => {
                let label = if report.running { "running" } else { "paused" };
                println!("{}  {} ({})", active.day, active, label);
                if report.awaiting_decision {
                    println!("Waiting for save, dismiss or cancel.");
                }
            }
            None => println!("00:00:00 (no active timer)"),
        },
    }

    Ok(report)
}
