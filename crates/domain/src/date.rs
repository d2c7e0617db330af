use chrono::{prelude::*, Duration, LocalResult};
use chrono_tz::Tz;
use thiserror::Error;

/// Stored weekday convention: index 0 holds weekday 1
const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

pub const INVALID_DAY: &str = "Invalid day";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Weekday `{0}` is out of range, expected 1 (Monday) to 7 (Sunday)")]
    WeekdayOutOfRange(i64),
    #[error("Time of day `{0}` is not a valid HH:MM time")]
    InvalidTimeOfDay(String),
    #[error("Local time `{0}` does not exist in timezone {1}")]
    NonexistentLocalTime(NaiveDateTime, Tz),
}

/// Converts a stored weekday (1 = Monday ... 7 = Sunday) into a `Weekday`
pub fn parse_weekday(weekday: i64) -> Result<Weekday, ValidationError> {
    if !(1..=7).contains(&weekday) {
        return Err(ValidationError::WeekdayOutOfRange(weekday));
    }
    Ok(WEEKDAYS[(weekday - 1) as usize])
}

/// Accepts `HH:MM` and the `HH:MM:SS` form that time columns are rendered as
pub fn parse_time_of_day(time_of_day: &str) -> Result<NaiveTime, ValidationError> {
    let trimmed = time_of_day.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTimeOfDay(time_of_day.to_string()))
}

/// Display name of a stored weekday. Never fails, unknown values
/// are rendered as `Invalid day`.
pub fn weekday_name(weekday: i64) -> &'static str {
    if (1..=7).contains(&weekday) {
        WEEKDAY_NAMES[(weekday - 1) as usize]
    } else {
        INVALID_DAY
    }
}

/// Computes the first date on or after the calendar day of `now` that falls on
/// `weekday`, at `time` in the timezone of `now`.
///
/// If `weekday` is today the result is today even when `time` has already passed,
/// it is up to the caller to discard occurrences in the past.
pub fn next_occurrence(
    weekday: Weekday,
    time: NaiveTime,
    now: &DateTime<Tz>,
) -> Result<DateTime<Tz>, ValidationError> {
    let today = now.date_naive();
    // Both sides are days from monday, 0..=6
    let target = i64::from(weekday.num_days_from_monday());
    let current = i64::from(today.weekday().num_days_from_monday());
    let delta = (target - current).rem_euclid(7);

    let date = today + Duration::days(delta);
    localize(&now.timezone(), date.and_time(time))
}

/// Attaches `tz` to a wall clock datetime.
///
/// Ambiguous times (clocks turned back) resolve to the earliest instant and
/// times inside a gap (clocks turned forward) are moved one hour ahead.
pub fn localize(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Tz>, ValidationError> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(datetime) => Ok(datetime),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => tz
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .ok_or(ValidationError::NonexistentLocalTime(local, *tz)),
    }
}
