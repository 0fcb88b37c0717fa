use thiserror::Error;

/// Failures raised by the time accumulator.
///
/// The shell never turns these into a process failure: they are logged and
/// reported, and the stored totals stay as they were.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TallyError {
    /// Summed fields of two durations exceed what a single day total may hold.
    #[error(
        "timer(s) invalid: {hours}h {minutes}m {seconds}s exceeds the limit of 60 seconds, 60 minutes and/or 24 hours"
    )]
    AccumulationOverflow {
        seconds: u32,
        minutes: u32,
        hours: u32,
    },
}
