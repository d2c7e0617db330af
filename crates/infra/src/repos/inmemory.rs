use super::{IStore, IStoreConnection, StoreError};
use guild_reminder_domain::{EventDefinition, NotificationTarget};
use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc, Mutex,
};

/// Store used when testing. Every connection works on a snapshot of the data
/// that was inserted when it was acquired.
pub struct InMemoryStore {
    targets: Mutex<Vec<NotificationTarget>>,
    events: Mutex<Vec<EventDefinition>>,
    unreachable: AtomicBool,
    failing_queries: AtomicBool,
    acquired: AtomicUsize,
    released: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            targets: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            unreachable: AtomicBool::new(false),
            failing_queries: AtomicBool::new(false),
            acquired: AtomicUsize::new(0),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn insert_target(&self, target: &NotificationTarget) {
        self.targets.lock().unwrap().push(target.clone());
    }

    pub fn insert_event(&self, event: &EventDefinition) {
        self.events.lock().unwrap().push(event.clone());
    }

    /// Makes every following `acquire` fail
    pub fn set_unreachable(&self, unreachable: bool) {
        self.unreachable.store(unreachable, Ordering::SeqCst);
    }

    /// Makes queries of connections acquired from now on fail
    pub fn set_failing_queries(&self, failing: bool) {
        self.failing_queries.store(failing, Ordering::SeqCst);
    }

    /// Number of connections handed out
    pub fn acquired_count(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }

    /// Number of connections that have been released or dropped
    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IStore for InMemoryStore {
    async fn acquire(&self) -> Result<Box<dyn IStoreConnection>, StoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Connection(
                "in-memory store is unreachable".into(),
            ));
        }
        self.acquired.fetch_add(1, Ordering::SeqCst);

        Ok(Box::new(InMemoryStoreConnection {
            targets: self.targets.lock().unwrap().clone(),
            events: self.events.lock().unwrap().clone(),
            failing_queries: self.failing_queries.load(Ordering::SeqCst),
            released: Arc::clone(&self.released),
        }))
    }
}

struct InMemoryStoreConnection {
    targets: Vec<NotificationTarget>,
    events: Vec<EventDefinition>,
    failing_queries: bool,
    released: Arc<AtomicUsize>,
}

impl InMemoryStoreConnection {
    fn check_query(&self) -> Result<(), StoreError> {
        if self.failing_queries {
            return Err(StoreError::Query("in-memory query failure".into()));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl IStoreConnection for InMemoryStoreConnection {
    async fn find_all_targets(&mut self) -> Result<Vec<NotificationTarget>, StoreError> {
        self.check_query()?;
        Ok(self.targets.clone())
    }

    async fn find_all_events(&mut self) -> Result<Vec<EventDefinition>, StoreError> {
        self.check_query()?;
        Ok(self.events.clone())
    }

    async fn release(self: Box<Self>) {}
}

impl Drop for InMemoryStoreConnection {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
