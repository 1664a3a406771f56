//! Storage whose writes can be held back.

use crate::error::Result;
use crate::providers::SessionStorage;
use crate::stores::MemoryStorage;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::watch;

/// In-memory storage with gates in front of `write` and `remove`.
///
/// While a gate is held, calls through it park until it is released, which
/// lets tests pin a store operation halfway through. Reads always pass.
#[derive(Debug, Clone)]
pub struct GatedStorage {
    inner: MemoryStorage,
    writes: Arc<watch::Sender<bool>>,
    removes: Arc<watch::Sender<bool>>,
    parked: Arc<AtomicUsize>,
}

impl Default for GatedStorage {
    fn default() -> Self {
        Self::new(MemoryStorage::new())
    }
}

impl GatedStorage {
    /// Gate `inner`, both gates open.
    #[must_use]
    pub fn new(inner: MemoryStorage) -> Self {
        Self {
            inner,
            writes: Arc::new(watch::channel(true).0),
            removes: Arc::new(watch::channel(true).0),
            parked: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The storage behind the gates.
    #[must_use]
    pub const fn inner(&self) -> &MemoryStorage {
        &self.inner
    }

    /// Park every write until `hold_writes(false)`.
    pub fn hold_writes(&self, hold: bool) {
        self.writes.send_replace(!hold);
    }

    /// Park every remove until `hold_removes(false)`.
    pub fn hold_removes(&self, hold: bool) {
        self.removes.send_replace(!hold);
    }

    /// Calls currently parked at a gate.
    #[must_use]
    pub fn parked(&self) -> usize {
        self.parked.load(Ordering::SeqCst)
    }

    async fn pass(&self, gate: &watch::Sender<bool>) {
        let mut open = gate.subscribe();
        if *open.borrow_and_update() {
            return;
        }

        self.parked.fetch_add(1, Ordering::SeqCst);
        let _ = open.wait_for(|open| *open).await.map(|_| ());
        self.parked.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SessionStorage for GatedStorage {
    async fn read(&self, key: &str) -> Result<Option<String>> {
        self.inner.read(key).await
    }

    async fn write(&self, key: &str, value: &str) -> Result<()> {
        self.pass(&self.writes).await;
        self.inner.write(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.pass(&self.removes).await;
        self.inner.remove(key).await
    }
}
