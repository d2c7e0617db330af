mod job_schedulers;
mod reminder;
mod shared;

use guild_reminder_infra::ReminderContext;
use job_schedulers::{start_send_reminders_job, warn_on_overlapping_windows};
use tracing::info;

pub use job_schedulers::{next_trigger_after, smallest_trigger_gap};
pub use reminder::{find_due_events, run_tick, TickFailure, TickReport};

pub struct Application {
    context: ReminderContext,
}

impl Application {
    pub fn new(context: ReminderContext) -> Self {
        let config = &context.config;
        info!(
            store = ?config.store,
            remind_minutes_before_start = config.remind_minutes_before_start,
            timezone = %config.timezone,
            trigger_times = ?config.trigger_times,
            message_format = ?config.message_format,
            run_on_startup = config.run_on_startup,
            "Starting guild reminder"
        );
        warn_on_overlapping_windows(config);

        Self { context }
    }

    /// Runs until the process is stopped
    pub async fn start(self) {
        start_send_reminders_job(self.context).await
    }
}
