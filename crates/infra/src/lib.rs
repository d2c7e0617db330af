mod config;
mod repos;
mod services;
mod system;

pub use config::{Config, ConfigError, StoreConfig};
pub use repos::{IStore, IStoreConnection, InMemoryStore, MySqlStore, StoreError};
pub use services::{DeliveryError, DiscordWebhookNotifier, INotifier, RecordingNotifier};
use std::sync::Arc;
pub use system::{ISys, RealSys, StaticTimeSys};

#[derive(Clone)]
pub struct ReminderContext {
    pub store: Arc<dyn IStore>,
    pub notifier: Arc<dyn INotifier>,
    pub config: Config,
    pub sys: Arc<dyn ISys>,
}

impl ReminderContext {
    fn create(config: Config) -> Self {
        Self {
            store: Arc::new(MySqlStore::new(&config.store)),
            notifier: Arc::new(DiscordWebhookNotifier::new()),
            config,
            sys: Arc::new(RealSys {}),
        }
    }

    /// Context backed by an in-memory store, used when testing
    pub fn create_inmemory(
        config: Config,
        store: Arc<InMemoryStore>,
        notifier: Arc<dyn INotifier>,
        sys: Arc<dyn ISys>,
    ) -> Self {
        Self {
            store,
            notifier,
            config,
            sys,
        }
    }
}

/// Will setup the infrastructure context given the configuration.
///
/// No connection is opened here, every reminder tick connects on its own.
pub fn setup_context(config: Config) -> ReminderContext {
    ReminderContext::create(config)
}
