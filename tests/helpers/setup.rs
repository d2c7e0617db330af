use chrono::{DateTime, Utc};
use guild_reminder_infra::{
    Config, DiscordWebhookNotifier, InMemoryStore, ReminderContext, StaticTimeSys,
};
use std::{collections::HashMap, sync::Arc};

pub struct TestApp {
    pub ctx: ReminderContext,
    pub store: Arc<InMemoryStore>,
}

/// Config as it would be read from the environment
pub fn config(overrides: &[(&str, &str)]) -> Config {
    let mut env: HashMap<String, String> = [
        ("MYSQL_DB", "pwm"),
        ("MYSQL_USER", "reminder"),
        ("MYSQL_PASS", "secret"),
        ("REMIND_TIME_BEFORE_START", "30"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    for (key, value) in overrides {
        env.insert(key.to_string(), value.to_string());
    }

    Config::from_lookup(|key| env.get(key).cloned()).expect("Expected a valid config")
}

// In-memory store with the real webhook notifier, frozen at `now`
pub fn spawn_app(config: Config, now: DateTime<Utc>) -> TestApp {
    let store = Arc::new(InMemoryStore::new());
    let ctx = ReminderContext::create_inmemory(
        config,
        store.clone(),
        Arc::new(DiscordWebhookNotifier::new()),
        Arc::new(StaticTimeSys(now)),
    );
    TestApp { ctx, store }
}
