mod date;
mod event;
mod notification;
mod reminder;
mod target;

pub use date::{
    localize, next_occurrence, parse_time_of_day, parse_weekday, weekday_name, ValidationError,
    INVALID_DAY,
};
pub use event::EventDefinition;
pub use notification::{Embed, EmbedField, EmbedFooter, MessageFormat, WebhookMessage};
pub use reminder::{DueEvent, ReminderWindow};
pub use target::{key_by_community, NotificationTarget};
