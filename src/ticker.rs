//! The single periodic tick source that drives the active timer.

use crate::accumulator::{Duration, tick};
use crate::platform::StatePaths;
use crate::state::{TickerGuard, with_state_lock};
use anyhow::{Context, Result};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct TickerOptions {
    pub interval: std::time::Duration,
    /// Stop (paused) after this many ticks.
    pub max_ticks: Option<u64>,
}

/// Why the ticker returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerExit {
    /// Another ticker was already advancing this timer; nothing was done.
    AlreadyRunning,
    /// Another ticker still owns the state directory and was told to keep going.
    Resumed,
    /// `running` was cleared by another invocation.
    Paused,
    /// Ctrl-C was received; the timer was paused.
    Interrupted,
    LimitReached,
    /// The active timer was saved or dismissed while running.
    Cleared,
}

enum Step {
    Ticked(Duration),
    Stop(TickerExit),
}

enum Claim {
    Owned(TickerGuard),
    Joined { was_running: bool },
}

/// Marks the timer as not running; a live ticker stops on its next tick.
///
/// Returns whether a live ticker was advancing the timer.
pub fn request_pause(paths: &StatePaths) -> Result<bool> {
    with_state_lock(&paths.lock, &paths.state, |state| {
        let was_running = state.running && is_ticker_alive(paths)?;
        state.running = false;
        Ok(was_running)
    })
}

/// Whether some process currently holds the ticker lock.
///
/// Call with the state lock held so the answer cannot race a starting ticker.
pub fn is_ticker_alive(paths: &StatePaths) -> Result<bool> {
    Ok(TickerGuard::try_acquire(&paths.ticker)?.is_none())
}

/// Clears `running` and gives up the ticker lock in one state-lock critical section.
fn release(paths: &StatePaths, guard: &mut Option<TickerGuard>) -> Result<()> {
    with_state_lock(&paths.lock, &paths.state, |state| {
        state.running = false;
        drop(guard.take());
        Ok(())
    })
}

/// Advances the persisted active timer once per interval until told to stop.
///
/// Each tick reads, advances and writes state under the state lock, so a pause,
/// save or dismiss from another process is seen on the following tick. `render`
/// receives every new value.
///
/// When another ticker still holds the ticker lock, `running` is set again
/// instead of starting a second tick source. The ticker lock is only claimed or
/// released while the state lock is held, so a live ticker always observes it.
pub async fn run_ticker<F>(
    paths: &StatePaths,
    options: &TickerOptions,
    mut render: F,
) -> Result<TickerExit>
where
    F: FnMut(&Duration),
{
    let claim = with_state_lock(&paths.lock, &paths.state, |state| {
        let claim = match TickerGuard::try_acquire(&paths.ticker)? {
            Some(guard) => Claim::Owned(guard),
            None => Claim::Joined {
                was_running: state.running,
            },
        };
        state.running = true;
        Ok(claim)
    })?;

    let mut guard = match claim {
        Claim::Owned(guard) => Some(guard),
        Claim::Joined { was_running: true } => return Ok(TickerExit::AlreadyRunning),
        Claim::Joined { was_running: false } => {
            info!("resumed timer in running ticker");
            return Ok(TickerExit::Resumed);
        }
    };
    info!(interval_ms = options.interval.as_millis() as u64, "ticker started");

    let mut interval = tokio::time::interval(options.interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    interval.tick().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let mut ticks: u64 = 0;
    loop {
        tokio::select! {
            _ = interval.tick() => {}
            res = &mut ctrl_c => {
                res.context("Failed to listen for Ctrl-C")?;
                release(paths, &mut guard)?;
                info!(ticks, "ticker interrupted");
                return Ok(TickerExit::Interrupted);
            }
        }

        let step = with_state_lock(&paths.lock, &paths.state, |state| {
            if !state.running {
                drop(guard.take());
                return Ok(Step::Stop(TickerExit::Paused));
            }
            let Some(active) = state.active_timer.as_ref() else {
                state.running = false;
                drop(guard.take());
                return Ok(Step::Stop(TickerExit::Cleared));
            };
            let next = tick(active);
            state.active_timer = Some(next.clone());
            Ok(Step::Ticked(next))
        })?;

        match step {
            Step::Stop(exit) => {
                info!(ticks, ?exit, "ticker stopped");
                return Ok(exit);
            }
            Step::Ticked(current) => {
                ticks += 1;
                debug!(%current, "tick");
                render(&current);
            }
        }

        if options.max_ticks.is_some_and(|max| ticks >= max) {
            release(paths, &mut guard)?;
            info!(ticks, "tick limit reached");
            return Ok(TickerExit::LimitReached);
        }
    }
}
