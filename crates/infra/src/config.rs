use chrono::NaiveTime;
use chrono_tz::Tz;
use guild_reminder_domain::{parse_time_of_day, MessageFormat};
use std::fmt;
use thiserror::Error;
use tracing::warn;

const DEFAULT_MYSQL_HOST: &str = "127.0.0.1";
const DEFAULT_MYSQL_PORT: u16 = 3306;
const DEFAULT_TIMEZONE: &str = "UTC";
/// Every 30 minutes between 16:00 and 22:00
const DEFAULT_TRIGGER_TIMES: &str =
    "16:00,16:30,17:00,17:30,18:00,18:30,19:00,19:30,20:00,20:30,21:00,21:30,22:00";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration value `{0}`")]
    Missing(&'static str),
    #[error("Invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings of the MySQL database holding the events
#[derive(Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store: StoreConfig,
    /// How many minutes before an event starts the guilds should be reminded.
    /// Every occurrence within `[now, now + remind_minutes_before_start]` is
    /// announced when a tick runs.
    pub remind_minutes_before_start: u32,
    /// Timezone the events and the trigger times are expressed in
    pub timezone: Tz,
    /// Wall clock times at which a reminder tick runs, sorted and without duplicates
    pub trigger_times: Vec<NaiveTime>,
    pub message_format: MessageFormat,
    /// Run one tick right away instead of waiting for the first trigger time
    pub run_on_startup: bool,
}

impl Config {
    /// Reads the configuration from the environment
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let require = |key: &'static str| get(key).ok_or(ConfigError::Missing(key));

        let host = get("MYSQL_HOST").unwrap_or_else(|| DEFAULT_MYSQL_HOST.into());
        let port = match get("MYSQL_PORT") {
            None => DEFAULT_MYSQL_PORT,
            Some(port) => match port.trim().parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    warn!(
                        "The given MYSQL_PORT: {} is not valid, falling back to the default port: {}.",
                        port, DEFAULT_MYSQL_PORT
                    );
                    DEFAULT_MYSQL_PORT
                }
            },
        };
        let store = StoreConfig {
            host,
            port,
            database: require("MYSQL_DB")?,
            user: require("MYSQL_USER")?,
            password: require("MYSQL_PASS")?,
        };

        let lookahead = require("REMIND_TIME_BEFORE_START")?;
        let remind_minutes_before_start =
            lookahead
                .trim()
                .parse::<u32>()
                .map_err(|e| ConfigError::Invalid {
                    key: "REMIND_TIME_BEFORE_START",
                    value: lookahead.clone(),
                    reason: e.to_string(),
                })?;

        let timezone = get("TIMEZONE").unwrap_or_else(|| DEFAULT_TIMEZONE.into());
        let timezone = timezone
            .trim()
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid {
                key: "TIMEZONE",
                value: timezone.clone(),
                reason: e.to_string(),
            })?;

        let trigger_times = get("REMINDER_TRIGGER_TIMES")
            .unwrap_or_else(|| DEFAULT_TRIGGER_TIMES.into());
        let trigger_times = parse_trigger_times(&trigger_times)?;

        let message_format = match get("REMINDER_MESSAGE_FORMAT") {
            None => MessageFormat::default(),
            Some(format) => format
                .parse::<MessageFormat>()
                .map_err(|reason| ConfigError::Invalid {
                    key: "REMINDER_MESSAGE_FORMAT",
                    value: format.clone(),
                    reason,
                })?,
        };

        let run_on_startup = match get("RUN_ON_STARTUP") {
            None => false,
            Some(flag) => parse_flag(&flag).ok_or_else(|| ConfigError::Invalid {
                key: "RUN_ON_STARTUP",
                value: flag.clone(),
                reason: "expected true or false".into(),
            })?,
        };

        Ok(Self {
            store,
            remind_minutes_before_start,
            timezone,
            trigger_times,
            message_format,
            run_on_startup,
        })
    }
}

fn parse_trigger_times(value: &str) -> Result<Vec<NaiveTime>, ConfigError> {
    let mut trigger_times = value
        .split(',')
        .filter(|time| !time.trim().is_empty())
        .map(|time| {
            parse_time_of_day(time).map_err(|e| ConfigError::Invalid {
                key: "REMINDER_TRIGGER_TIMES",
                value: value.to_string(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if trigger_times.is_empty() {
        return Err(ConfigError::Invalid {
            key: "REMINDER_TRIGGER_TIMES",
            value: value.to_string(),
            reason: "at least one trigger time is needed".into(),
        });
    }
    trigger_times.sort();
    trigger_times.dedup();
    Ok(trigger_times)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
