use crate::date::{next_occurrence, parse_time_of_day, parse_weekday, ValidationError};
use chrono::{DateTime, NaiveTime, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// An `EventDefinition` is a guild event that recurs every week on the
/// same weekday and at the same local time.
///
/// The fields are kept exactly as they are stored so that malformed records
/// can still be loaded and reported, instead of failing the whole load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub event_id: i64,
    pub name: String,
    /// 1 = Monday ... 7 = Sunday
    pub weekday: i64,
    /// Local time of day formatted as `HH:MM`
    pub time_of_day: String,
    pub description: String,
}

impl EventDefinition {
    /// Validated recurrence anchor of this event
    pub fn recurrence(&self) -> Result<(Weekday, NaiveTime), ValidationError> {
        let weekday = parse_weekday(self.weekday)?;
        let time = parse_time_of_day(&self.time_of_day)?;
        Ok((weekday, time))
    }

    /// The next time this event happens, relative to the calendar day of `now`
    pub fn next_occurrence(&self, now: &DateTime<Tz>) -> Result<DateTime<Tz>, ValidationError> {
        let (weekday, time) = self.recurrence()?;
        next_occurrence(weekday, time, now)
    }
}
