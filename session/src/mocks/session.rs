//! Mock session store for testing.

use crate::error::{Result, SessionError};
use crate::providers::SessionStore;
use crate::state::{Role, SessionRecord, SessionStatus, UserProfile};
use crate::mocks::GatedStorage;
use crate::stores::{MemoryStorage, PersistentSessionStore, SessionPolicy};
use school_session_core::environment::Clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Mock session store.
///
/// Real session rules over in-memory storage, plus switches to make
/// individual operations fail, counters of how often each ran, and a
/// [`GatedStorage`] to stall writes halfway through an operation.
#[derive(Debug, Clone)]
pub struct MockSessionStore<C> {
    inner: PersistentSessionStore<GatedStorage, C>,
    fail_saves: Arc<AtomicBool>,
    fail_checks: Arc<AtomicBool>,
    fail_touches: Arc<AtomicBool>,
    checks: Arc<AtomicUsize>,
    touches: Arc<AtomicUsize>,
}

impl<C: Clock> MockSessionStore<C> {
    /// Create a mock store with the default policy.
    #[must_use]
    pub fn new(clock: C) -> Self {
        Self::with_policy(clock, SessionPolicy::default())
    }

    /// Create a mock store with a custom policy.
    #[must_use]
    pub fn with_policy(clock: C, policy: SessionPolicy) -> Self {
        Self {
            inner: PersistentSessionStore::new(GatedStorage::default(), clock, policy),
            fail_saves: Arc::new(AtomicBool::new(false)),
            fail_checks: Arc::new(AtomicBool::new(false)),
            fail_touches: Arc::new(AtomicBool::new(false)),
            checks: Arc::new(AtomicUsize::new(0)),
            touches: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Underlying storage, shared with the store.
    #[must_use]
    pub const fn storage(&self) -> &MemoryStorage {
        self.inner.storage().inner()
    }

    /// Gates in front of the storage writes.
    #[must_use]
    pub const fn gate(&self) -> &GatedStorage {
        self.inner.storage()
    }

    /// Make `save` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Make `check` (and `get_current`) fail.
    pub fn fail_checks(&self, fail: bool) {
        self.fail_checks.store(fail, Ordering::SeqCst);
    }

    /// Make `touch_activity` fail.
    pub fn fail_touches(&self, fail: bool) {
        self.fail_touches.store(fail, Ordering::SeqCst);
    }

    /// Number of `check` calls so far, failed ones included.
    #[must_use]
    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    /// Number of `touch_activity` calls so far, failed ones included.
    #[must_use]
    pub fn touch_count(&self) -> usize {
        self.touches.load(Ordering::SeqCst)
    }

    /// Read the slot without evaluating it.
    ///
    /// # Errors
    ///
    /// Returns error if the stored payload cannot be decoded.
    pub async fn peek(&self) -> Result<Option<SessionRecord>> {
        use crate::constants::DEFAULT_STORAGE_KEY;
        use crate::providers::SessionStorage;

        match self.storage().read(DEFAULT_STORAGE_KEY).await? {
            Some(payload) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| SessionError::Corrupt(e.to_string())),
            None => Ok(None),
        }
    }

    fn injected(operation: &str) -> SessionError {
        SessionError::Storage(format!("injected {operation} failure"))
    }
}

impl<C: Clock> SessionStore for MockSessionStore<C> {
    async fn save(&self, user: &UserProfile, standard_roles: &[Role]) -> Result<SessionRecord> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Self::injected("save"));
        }
        self.inner.save(user, standard_roles).await
    }

    async fn touch_activity(&self) -> Result<Option<SessionRecord>> {
        self.touches.fetch_add(1, Ordering::SeqCst);
        if self.fail_touches.load(Ordering::SeqCst) {
            return Err(Self::injected("touch"));
        }
        self.inner.touch_activity().await
    }

    async fn check(&self) -> Result<SessionStatus> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        if self.fail_checks.load(Ordering::SeqCst) {
            return Err(Self::injected("check"));
        }
        self.inner.check().await
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await
    }
}
