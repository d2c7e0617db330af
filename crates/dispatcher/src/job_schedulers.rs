use crate::reminder::run_tick;
use chrono::{DateTime, Duration, NaiveTime};
use chrono_tz::Tz;
use guild_reminder_domain::localize;
use guild_reminder_infra::{Config, ReminderContext};
use tokio::time::sleep;
use tracing::{error, info, warn};

/// The first trigger time strictly after `now`, looking at today and tomorrow
/// in the timezone of `now`
pub fn next_trigger_after(now: &DateTime<Tz>, trigger_times: &[NaiveTime]) -> Option<DateTime<Tz>> {
    let today = now.date_naive();
    let tz = now.timezone();
    (0..=1)
        .flat_map(move |days| {
            let date = today + Duration::days(days);
            trigger_times.iter().map(move |time| date.and_time(*time))
        })
        .filter_map(|local| localize(&tz, local).ok())
        .filter(|trigger| trigger > now)
        .min()
}

/// Smallest distance between two consecutive trigger times, wrapping around midnight
pub fn smallest_trigger_gap(trigger_times: &[NaiveTime]) -> Option<Duration> {
    let mut times = trigger_times.to_vec();
    times.sort();
    times.dedup();

    let first = *times.first()?;
    let last = *times.last()?;
    let wrap_around = Duration::days(1) - last.signed_duration_since(first);

    times
        .windows(2)
        .map(|pair| pair[1].signed_duration_since(pair[0]))
        .chain(std::iter::once(wrap_around))
        .min()
}

/// No record is kept of reminders that were already sent, so when the window
/// of one tick reaches into the window of the next one the same occurrence is
/// announced twice.
pub fn warn_on_overlapping_windows(config: &Config) {
    if let Some(gap) = smallest_trigger_gap(&config.trigger_times) {
        if i64::from(config.remind_minutes_before_start) > gap.num_minutes() {
            warn!(
                "REMIND_TIME_BEFORE_START ({} minutes) is longer than the smallest gap between two trigger times ({} minutes). Events may be reminded more than once.",
                config.remind_minutes_before_start,
                gap.num_minutes()
            );
        }
    }
}

async fn sleep_until(ctx: &ReminderContext, instant: &DateTime<Tz>) {
    // The wall clock is checked again after waking up so that a tick never
    // starts before its trigger time
    loop {
        let now = ctx.sys.now().with_timezone(&ctx.config.timezone);
        match (*instant - now).to_std() {
            Ok(remaining) if !remaining.is_zero() => sleep(remaining).await,
            _ => return,
        }
    }
}

/// Runs a reminder tick at every configured trigger time, forever.
///
/// Ticks run one after another. Trigger times that pass while a tick is
/// still running are skipped.
pub async fn start_send_reminders_job(ctx: ReminderContext) {
    if ctx.config.run_on_startup {
        info!("Running reminder tick on startup");
        run_tick(&ctx).await;
    }

    loop {
        let now = ctx.sys.now().with_timezone(&ctx.config.timezone);
        let next_run = match next_trigger_after(&now, &ctx.config.trigger_times) {
            Some(next_run) => next_run,
            None => {
                error!("No reminder trigger times are configured. Stopping the reminder job.");
                return;
            }
        };
        info!("Next reminder tick scheduled at {}", next_run);

        sleep_until(&ctx, &next_run).await;
        run_tick(&ctx).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::{Europe::Oslo, UTC};

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn trigger_times() -> Vec<NaiveTime> {
        vec![time(16, 0), time(16, 30), time(22, 0)]
    }

    #[test]
    fn next_trigger_is_later_today() {
        let now = UTC.with_ymd_and_hms(2024, 1, 1, 16, 10, 0).unwrap();
        assert_eq!(
            next_trigger_after(&now, &trigger_times()),
            Some(UTC.with_ymd_and_hms(2024, 1, 1, 16, 30, 0).unwrap())
        );
    }

    #[test]
    fn trigger_at_now_is_not_repeated() {
        let now = UTC.with_ymd_and_hms(2024, 1, 1, 16, 0, 0).unwrap();
        assert_eq!(
            next_trigger_after(&now, &trigger_times()),
            Some(UTC.with_ymd_and_hms(2024, 1, 1, 16, 30, 0).unwrap())
        );
    }

    #[test]
    fn next_trigger_wraps_to_tomorrow() {
        let now = UTC.with_ymd_and_hms(2024, 1, 1, 22, 0, 1).unwrap();
        assert_eq!(
            next_trigger_after(&now, &trigger_times()),
            Some(UTC.with_ymd_and_hms(2024, 1, 2, 16, 0, 0).unwrap())
        );
    }

    #[test]
    fn trigger_times_follow_configured_timezone() {
        let now = Oslo.with_ymd_and_hms(2024, 1, 1, 15, 0, 0).unwrap();
        let next = next_trigger_after(&now, &trigger_times()).unwrap();
        assert_eq!(next.to_rfc3339(), "2024-01-01T16:00:00+01:00");
    }

    #[test]
    fn no_trigger_times_no_next_trigger() {
        let now = UTC.with_ymd_and_hms(2024, 1, 1, 16, 10, 0).unwrap();
        assert_eq!(next_trigger_after(&now, &[]), None);
    }

    #[test]
    fn it_finds_smallest_trigger_gap() {
        assert_eq!(
            smallest_trigger_gap(&trigger_times()),
            Some(Duration::minutes(30))
        );
        // 22:00 -> 01:00 over midnight
        assert_eq!(
            smallest_trigger_gap(&[time(1, 0), time(12, 0), time(22, 0)]),
            Some(Duration::hours(3))
        );
        assert_eq!(
            smallest_trigger_gap(&[time(8, 0)]),
            Some(Duration::days(1))
        );
        assert_eq!(smallest_trigger_gap(&[]), None);
    }
}
