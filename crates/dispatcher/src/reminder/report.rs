use chrono::DateTime;
use chrono_tz::Tz;
use guild_reminder_domain::{DueEvent, NotificationTarget, ValidationError};
use guild_reminder_infra::DeliveryError;
use std::fmt::{self, Display};

#[derive(Debug, Clone, PartialEq)]
pub enum TickFailure {
    /// The store could not be read and nothing was sent
    Store { reason: String },
    /// The event was skipped for this tick
    InvalidEvent { event_id: i64, reason: String },
    /// The reminder for the event did not reach the guild
    Delivery {
        event_id: i64,
        community_name: String,
        reason: String,
    },
}

impl Display for TickFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store { reason } => write!(f, "store unavailable: {}", reason),
            Self::InvalidEvent { event_id, reason } => {
                write!(f, "event {} is invalid: {}", event_id, reason)
            }
            Self::Delivery {
                event_id,
                community_name,
                reason,
            } => write!(
                f,
                "reminder for event {} to guild '{}' failed: {}",
                event_id, community_name, reason
            ),
        }
    }
}

/// Outcome of a single reminder tick
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Start of the reminder window
    pub now: DateTime<Tz>,
    pub events_considered: usize,
    pub events_due: usize,
    pub notifications_attempted: usize,
    pub notifications_succeeded: usize,
    pub notifications_failed: usize,
    pub failures: Vec<TickFailure>,
}

impl TickReport {
    pub fn new(now: DateTime<Tz>) -> Self {
        Self {
            now,
            events_considered: 0,
            events_due: 0,
            notifications_attempted: 0,
            notifications_succeeded: 0,
            notifications_failed: 0,
            failures: Vec::new(),
        }
    }

    /// Report of a tick that never got to read the store
    pub fn aborted(now: DateTime<Tz>, reason: String) -> Self {
        let mut report = Self::new(now);
        report.failures.push(TickFailure::Store { reason });
        report
    }

    pub fn is_aborted(&self) -> bool {
        self.failures
            .iter()
            .any(|f| matches!(f, TickFailure::Store { .. }))
    }

    pub(crate) fn record_invalid_event(&mut self, event_id: i64, error: &ValidationError) {
        self.failures.push(TickFailure::InvalidEvent {
            event_id,
            reason: error.to_string(),
        });
    }

    pub(crate) fn record_delivery(
        &mut self,
        due: &DueEvent,
        target: &NotificationTarget,
        res: &Result<(), DeliveryError>,
    ) {
        self.notifications_attempted += 1;
        match res {
            Ok(_) => self.notifications_succeeded += 1,
            Err(e) => {
                self.notifications_failed += 1;
                self.failures.push(TickFailure::Delivery {
                    event_id: due.event.event_id,
                    community_name: target.community_name.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
}
