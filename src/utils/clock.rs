use chrono::{Local, NaiveDate};

use crate::accumulator::DayKey;

/// Source of "today" for the shell, so day-boundary behavior can be tested.
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;

    fn day_key(&self) -> DayKey {
        DayKey::from_date(self.today())
    }
}

/// Local calendar date of the machine.
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Always reports the same date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
