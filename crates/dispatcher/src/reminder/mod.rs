mod report;
mod send_event_reminders;

pub use report::{TickFailure, TickReport};
pub use send_event_reminders::{find_due_events, run_tick};
