mod inmemory;
mod mysql;

use guild_reminder_domain::{EventDefinition, NotificationTarget};
use thiserror::Error;

pub use inmemory::InMemoryStore;
pub use mysql::MySqlStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Unable to connect to the store: {0}")]
    Connection(String),
    #[error("Store query failed: {0}")]
    Query(String),
}

/// The relational store holding the events and the guilds to remind.
///
/// Every reminder tick acquires its own connection and gives it back when the
/// tick is done. Nothing is ever written to the store.
#[async_trait::async_trait]
pub trait IStore: Send + Sync {
    async fn acquire(&self) -> Result<Box<dyn IStoreConnection>, StoreError>;
}

#[async_trait::async_trait]
pub trait IStoreConnection: Send {
    async fn find_all_targets(&mut self) -> Result<Vec<NotificationTarget>, StoreError>;
    async fn find_all_events(&mut self) -> Result<Vec<EventDefinition>, StoreError>;
    /// Closes the connection. A connection that is dropped without being
    /// released is closed as well.
    async fn release(self: Box<Self>);
}
