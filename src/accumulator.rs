//! Elapsed-time arithmetic for the stopwatch.
//!
//! A [`Duration`] is advanced one second at a time by [`tick`] while the timer
//! runs. When the user saves, [`reconcile_day`] folds it into the history of
//! daily totals, merging into the newest entry when both belong to the same day.

use crate::error::TallyError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, error};

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

/// Calendar-day identifier in the form `MON|DD|YYYY`, compared only for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(String);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        let month = MONTHS[date.month0() as usize];
        Self(format!("{}|{:02}|{}", month, date.day(), date.year()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DayKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Elapsed time split into clock fields, tagged with the day it was recorded on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub seconds: u32,
    pub minutes: u32,
    pub hours: u32,
    #[serde(rename = "date")]
    pub day: DayKey,
}

impl Duration {
    pub fn new(seconds: u32, minutes: u32, hours: u32, day: impl Into<DayKey>) -> Self {
        Self {
            seconds,
            minutes,
            hours,
            day: day.into(),
        }
    }

    pub fn zero(day: DayKey) -> Self {
        Self::new(0, 0, 0, day)
    }
}

/// Renders `HH:MM:SS`, padding each field below 10 with a leading zero.
impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// How [`merge`] treats a sum whose hours only reach 24 after carrying minutes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayBoundary {
    /// Reject any result of 24 hours or more.
    #[default]
    Strict,
    /// Only check the pre-carry sums, so a merged total may land on exactly 24h.
    Compatible,
}

/// Finalized per-day totals, newest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History(Vec<Duration>);

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(&self) -> Option<&Duration> {
        self.0.first()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Duration> {
        self.0.iter()
    }

    fn prepend(&mut self, duration: Duration) {
        self.0.insert(0, duration);
    }
}

impl From<Vec<Duration>> for History {
    fn from(entries: Vec<Duration>) -> Self {
        Self(entries)
    }
}

/// What [`reconcile_day`] did with the active duration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// History was empty; the active duration became its first entry.
    Started,
    /// The active duration belongs to a different day than the newest entry.
    NewDay { previous: DayKey },
    /// Added onto the newest entry of the same day.
    Merged,
    /// The sum was out of range; history is unchanged.
    Rejected(TallyError),
}

/// Advances a duration by one second, carrying into minutes and hours.
///
/// Hours are not wrapped here: a timer left running past midnight keeps counting.
pub fn tick(duration: &Duration) -> Duration {
    let mut next = duration.clone();
    next.seconds += 1;
    if next.seconds >= 60 {
        next.seconds = 0;
        next.minutes += 1;
        if next.minutes >= 60 {
            next.minutes = 0;
            next.hours += 1;
        }
    }
    next
}

/// Adds `incoming` onto `accumulated`, keeping the accumulated day.
///
/// The pre-carry sums must stay below 120 seconds, 120 minutes and 24 hours.
/// Each field is carried at most once, so that check is what keeps the result
/// normalized. On error the caller still owns the unchanged `accumulated`.
pub fn merge(
    incoming: &Duration,
    accumulated: &Duration,
    boundary: DayBoundary,
) -> Result<Duration, TallyError> {
    let mut seconds = accumulated.seconds.saturating_add(incoming.seconds);
    let mut minutes = accumulated.minutes.saturating_add(incoming.minutes);
    let mut hours = accumulated.hours.saturating_add(incoming.hours);

    if seconds >= 120 || minutes >= 120 || hours >= 24 {
        return Err(overflow(seconds, minutes, hours));
    }

    if seconds >= 60 {
        seconds -= 60;
        minutes += 1;
    }
    if minutes >= 60 {
        minutes -= 60;
        hours += 1;
    }

    if boundary == DayBoundary::Strict && hours >= 24 {
        return Err(overflow(seconds, minutes, hours));
    }

    let merged = Duration {
        seconds,
        minutes,
        hours,
        day: accumulated.day.clone(),
    };
    debug!(day = %merged.day, total = %merged, "merged timer into day total");
    Ok(merged)
}

fn overflow(seconds: u32, minutes: u32, hours: u32) -> TallyError {
    let err = TallyError::AccumulationOverflow {
        seconds,
        minutes,
        hours,
    };
    error!("{err}");
    err
}

/// Folds the active duration into history.
///
/// A new head is prepended when history is empty or its newest entry is from
/// another day; otherwise the head is replaced by the merged total. A rejected
/// merge leaves history exactly as it was.
pub fn reconcile_day(
    active: &Duration,
    mut history: History,
    boundary: DayBoundary,
) -> (History, Reconciliation) {
    let Some(head) = history.head() else {
        history.prepend(active.clone());
        return (history, Reconciliation::Started);
    };

    if head.day != active.day {
        let previous = head.day.clone();
        history.prepend(active.clone());
        return (history, Reconciliation::NewDay { previous });
    }

    match merge(active, head, boundary) {
        Ok(merged) => {
            history.0[0] = merged;
            (history, Reconciliation::Merged)
        }
        Err(err) => (history, Reconciliation::Rejected(err)),
    }
}
