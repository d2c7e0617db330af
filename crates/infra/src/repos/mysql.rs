use super::{IStore, IStoreConnection, StoreError};
use crate::config::StoreConfig;
use guild_reminder_domain::{EventDefinition, NotificationTarget};
use sqlx::{
    mysql::{MySqlConnectOptions, MySqlConnection},
    Connection, FromRow,
};
use std::time::Duration;
use tracing::{error, info};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Stored in place of a missing day or time so that the event is rejected
/// when its occurrence is computed
const MISSING_WEEKDAY: i64 = 0;
const MISSING_TIME_OF_DAY: &str = "";

pub struct MySqlStore {
    address: String,
    options: MySqlConnectOptions,
    connect_timeout: Duration,
}

impl MySqlStore {
    pub fn new(config: &StoreConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password);
        Self {
            address: format!("{}:{}/{}", config.host, config.port, config.database),
            options,
            connect_timeout: CONNECT_TIMEOUT,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }
}

#[async_trait::async_trait]
impl IStore for MySqlStore {
    async fn acquire(&self) -> Result<Box<dyn IStoreConnection>, StoreError> {
        let connecting = MySqlConnection::connect_with(&self.options);
        let conn = match tokio::time::timeout(self.connect_timeout, connecting).await {
            Ok(Ok(conn)) => conn,
            Ok(Err(e)) => {
                error!(
                    "Unable to connect to MySQL at {}. Error: {:?}",
                    self.address, e
                );
                return Err(StoreError::Connection(e.to_string()));
            }
            Err(_) => {
                error!(
                    "Connecting to MySQL at {} timed out after {:?}",
                    self.address, self.connect_timeout
                );
                return Err(StoreError::Connection(format!(
                    "timed out after {:?}",
                    self.connect_timeout
                )));
            }
        };
        info!("Connected to MySQL database at {}", self.address);

        Ok(Box::new(MySqlStoreConnection {
            conn,
            address: self.address.clone(),
        }))
    }
}

struct MySqlStoreConnection {
    conn: MySqlConnection,
    address: String,
}

#[derive(Debug, FromRow)]
struct NotificationTargetRaw {
    discord_guild_name: String,
    discord_webhook_id: String,
    discord_role_id: Option<String>,
}

impl From<NotificationTargetRaw> for NotificationTarget {
    fn from(e: NotificationTargetRaw) -> Self {
        NotificationTarget::new(
            &e.discord_guild_name,
            &e.discord_webhook_id,
            e.discord_role_id.as_deref(),
        )
    }
}

#[derive(Debug, FromRow)]
struct EventDefinitionRaw {
    event_id: i64,
    event_name: Option<String>,
    event_day: Option<i64>,
    event_time: Option<String>,
    event_description: Option<String>,
}

impl From<EventDefinitionRaw> for EventDefinition {
    fn from(e: EventDefinitionRaw) -> Self {
        Self {
            event_id: e.event_id,
            name: e.event_name.unwrap_or_default(),
            weekday: e.event_day.unwrap_or(MISSING_WEEKDAY),
            time_of_day: e
                .event_time
                .unwrap_or_else(|| MISSING_TIME_OF_DAY.to_string()),
            description: e.event_description.unwrap_or_default(),
        }
    }
}

#[async_trait::async_trait]
impl IStoreConnection for MySqlStoreConnection {
    async fn find_all_targets(&mut self) -> Result<Vec<NotificationTarget>, StoreError> {
        let targets: Vec<NotificationTargetRaw> = sqlx::query_as(
            r#"
            SELECT discord_guild_name,
                discord_webhook_id,
                CAST(discord_role_id AS CHAR) AS discord_role_id
            FROM discord
            "#,
        )
        .fetch_all(&mut self.conn)
        .await
        .map_err(|e| {
            error!("Unable to load discord webhooks. DB returned error: {:?}", e);
            StoreError::Query(e.to_string())
        })?;

        Ok(targets.into_iter().map(|t| t.into()).collect())
    }

    async fn find_all_events(&mut self) -> Result<Vec<EventDefinition>, StoreError> {
        // Day and time are cast so both numeric/text and TIME/VARCHAR columns load
        let events: Vec<EventDefinitionRaw> = sqlx::query_as(
            r#"
            SELECT CAST(event_id AS SIGNED) AS event_id,
                event_name,
                CAST(event_day AS SIGNED) AS event_day,
                CAST(event_time AS CHAR) AS event_time,
                event_description
            FROM events
            "#,
        )
        .fetch_all(&mut self.conn)
        .await
        .map_err(|e| {
            error!("Unable to load events. DB returned error: {:?}", e);
            StoreError::Query(e.to_string())
        })?;

        Ok(events.into_iter().map(|e| e.into()).collect())
    }

    async fn release(self: Box<Self>) {
        let MySqlStoreConnection { conn, address } = *self;
        match conn.close().await {
            Ok(_) => info!("MySQL connection to {} is closed", address),
            Err(e) => error!("Unable to close MySQL connection to {}: {:?}", address, e),
        }
    }
}
