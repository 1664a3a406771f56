//! Single-slot session store over a key/value backend.

use crate::constants::DEFAULT_STORAGE_KEY;
use crate::error::{Result, SessionError};
use crate::providers::{SessionStorage, SessionStore};
use crate::state::{Role, SessionRecord, SessionStatus, UserProfile};
use chrono::{DateTime, Duration, SubsecRound, Utc};
use school_session_core::environment::Clock;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Expiry rules applied by [`PersistentSessionStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    /// Absolute lifetime, counted from save.
    pub session_duration: Duration,
    /// Maximum gap between two activity records for flagged sessions.
    pub inactivity_timeout: Duration,
}

impl SessionPolicy {
    /// Create a policy.
    #[must_use]
    pub const fn new(session_duration: Duration, inactivity_timeout: Duration) -> Self {
        Self {
            session_duration,
            inactivity_timeout,
        }
    }

    /// Classify `record` at `now`. Expiry wins over inactivity.
    #[must_use]
    pub fn evaluate(&self, record: SessionRecord, now: DateTime<Utc>) -> SessionStatus {
        if record.is_expired_at(now) {
            SessionStatus::Expired
        } else if record.is_inactive_at(now, self.inactivity_timeout) {
            SessionStatus::Inactive
        } else {
            SessionStatus::Active(record)
        }
    }
}

impl Default for SessionPolicy {
    fn default() -> Self {
        crate::config::SessionConfig::default().policy()
    }
}

/// Session store persisting one JSON record in a [`SessionStorage`] slot.
///
/// Every operation holds the slot lock from its first read to its last
/// write, so a touch can never write back a record that a concurrent
/// `clear` or lazy expiry already removed. Clones share the lock.
///
/// # Example
///
/// ```
/// use school_session::{
///     MemoryStorage, PersistentSessionStore, Role, SessionPolicy, SessionStore, UserProfile,
/// };
/// use school_session_core::SystemClock;
///
/// # tokio_test::block_on(async {
/// let store =
///     PersistentSessionStore::new(MemoryStorage::new(), SystemClock, SessionPolicy::default());
/// let user = UserProfile::new("7", "admin@school.test", ["admin"]);
///
/// let record = store.save(&user, &[Role::new("caisse")]).await?;
/// assert!(!record.requires_inactivity_check);
/// assert_eq!(store.get_current().await?, Some(record));
/// # Ok::<(), school_session::SessionError>(())
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct PersistentSessionStore<B, C> {
    storage: B,
    clock: C,
    policy: SessionPolicy,
    key: String,
    slot: Arc<Mutex<()>>,
}

impl<B, C> PersistentSessionStore<B, C>
where
    B: SessionStorage,
    C: Clock,
{
    /// Create a store using the default `"currentUser"` slot.
    #[must_use]
    pub fn new(storage: B, clock: C, policy: SessionPolicy) -> Self {
        Self {
            storage,
            clock,
            policy,
            key: DEFAULT_STORAGE_KEY.to_string(),
            slot: Arc::new(Mutex::new(())),
        }
    }

    /// Use another storage slot.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// The expiry rules in force.
    #[must_use]
    pub const fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    /// The storage backend.
    #[must_use]
    pub const fn storage(&self) -> &B {
        &self.storage
    }

    /// Current time at the precision of the persisted form.
    fn now(&self) -> DateTime<Utc> {
        self.clock.now().trunc_subsecs(3)
    }

    async fn load(&self) -> Result<Option<SessionRecord>> {
        let Some(payload) = self.storage.read(&self.key).await? else {
            return Ok(None);
        };

        serde_json::from_str(&payload).map(Some).map_err(|e| {
            tracing::warn!(key = %self.key, error = %e, "Stored session record is unreadable");
            SessionError::Corrupt(e.to_string())
        })
    }

    async fn persist(&self, record: &SessionRecord) -> Result<()> {
        let payload =
            serde_json::to_string(record).map_err(|e| SessionError::Serialization(e.to_string()))?;
        self.storage.write(&self.key, &payload).await
    }
}

impl<B, C> SessionStore for PersistentSessionStore<B, C>
where
    B: SessionStorage,
    C: Clock,
{
    #[tracing::instrument(skip(self, user, standard_roles), fields(user_id = %user.id))]
    async fn save(&self, user: &UserProfile, standard_roles: &[Role]) -> Result<SessionRecord> {
        let _slot = self.slot.lock().await;
        let now = self.now();
        let record = SessionRecord {
            user: user.clone(),
            expires_at: now + self.policy.session_duration,
            last_activity: now,
            requires_inactivity_check: user.has_any_role(standard_roles),
        };

        self.persist(&record).await?;

        tracing::info!(
            user_id = %record.user.id,
            expires_at = %record.expires_at,
            requires_inactivity_check = record.requires_inactivity_check,
            "Saved session"
        );

        Ok(record)
    }

    async fn touch_activity(&self) -> Result<Option<SessionRecord>> {
        let _slot = self.slot.lock().await;
        let Some(mut record) = self.load().await? else {
            tracing::trace!("No session to touch");
            return Ok(None);
        };

        record.last_activity = self.now();
        self.persist(&record).await?;

        tracing::trace!(user_id = %record.user.id, "Recorded activity");
        Ok(Some(record))
    }

    #[tracing::instrument(skip(self), level = "debug")]
    async fn check(&self) -> Result<SessionStatus> {
        let _slot = self.slot.lock().await;
        let Some(record) = self.load().await? else {
            return Ok(SessionStatus::Absent);
        };

        let user_id = record.user.id.clone();
        let status = self.policy.evaluate(record, self.now());

        if matches!(status, SessionStatus::Expired | SessionStatus::Inactive) {
            self.storage.remove(&self.key).await?;
            tracing::info!(user_id = %user_id, status = ?status, "Cleared lapsed session");
        }

        Ok(status)
    }

    async fn clear(&self) -> Result<()> {
        let _slot = self.slot.lock().await;
        self.storage.remove(&self.key).await?;
        tracing::debug!(key = %self.key, "Cleared session slot");
        Ok(())
    }
}
