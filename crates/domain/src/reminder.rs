use crate::event::EventDefinition;
use chrono::{DateTime, Duration};
use chrono_tz::Tz;

/// The interval `[now, now + lookahead]` in which event occurrences are due
/// for a reminder.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderWindow {
    pub now: DateTime<Tz>,
    pub threshold: DateTime<Tz>,
}

impl ReminderWindow {
    pub fn new(now: DateTime<Tz>, lookahead_minutes: u32) -> Self {
        let threshold = now + Duration::minutes(i64::from(lookahead_minutes));
        Self { now, threshold }
    }

    /// Both bounds are inclusive
    pub fn contains(&self, occurrence: &DateTime<Tz>) -> bool {
        self.now <= *occurrence && *occurrence <= self.threshold
    }
}

/// An `EventDefinition` together with the occurrence that is about to start
#[derive(Debug, Clone, PartialEq)]
pub struct DueEvent {
    pub event: EventDefinition,
    pub occurrence: DateTime<Tz>,
}
