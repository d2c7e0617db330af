use crate::date::{parse_time_of_day, weekday_name};
use crate::reminder::DueEvent;
use crate::target::NotificationTarget;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Blue
const EMBED_COLOR: u32 = 5814783;
const EMBED_FOOTER: &str = "Don't miss it!";

/// How reminders are rendered for the guilds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageFormat {
    /// Text content only
    Plain,
    /// Text content followed by a rich embed
    Embed,
}

impl Default for MessageFormat {
    fn default() -> Self {
        Self::Embed
    }
}

impl FromStr for MessageFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "embed" => Ok(Self::Embed),
            other => Err(format!("unknown message format: {}", other)),
        }
    }
}

/// Body of a webhook execution request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebhookMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    pub footer: EmbedFooter,
    /// ISO-8601 with offset
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

/// The stored time of day. It differs from the occurrence when the local
/// time falls into a DST gap.
fn display_time(due: &DueEvent) -> String {
    match parse_time_of_day(&due.event.time_of_day) {
        Ok(time) => time.format("%H:%M").to_string(),
        Err(_) => due.occurrence.format("%H:%M").to_string(),
    }
}

impl WebhookMessage {
    pub fn reminder(due: &DueEvent, target: &NotificationTarget, format: MessageFormat) -> Self {
        let event = &due.event;
        let content = format!(
            "{} {} - {}",
            target.mention(),
            event.name,
            event.description
        );

        let embeds = match format {
            MessageFormat::Plain => Vec::new(),
            MessageFormat::Embed => vec![Embed {
                title: format!("Reminder for Event: {}", event.name),
                description: event.description.clone(),
                color: EMBED_COLOR,
                fields: vec![
                    EmbedField {
                        name: "Day".into(),
                        value: weekday_name(event.weekday).into(),
                        inline: true,
                    },
                    EmbedField {
                        name: "Time".into(),
                        value: display_time(due),
                        inline: true,
                    },
                ],
                footer: EmbedFooter {
                    text: EMBED_FOOTER.into(),
                },
                timestamp: due.occurrence.to_rfc3339(),
            }],
        };

        Self { content, embeds }
    }
}
