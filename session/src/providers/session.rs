//! Session store trait.

use crate::error::Result;
use crate::state::{Role, SessionRecord, SessionStatus, UserProfile};
use std::future::Future;

/// Single-slot session store.
///
/// Holds at most one [`SessionRecord`]. Expiry and inactivity are evaluated
/// lazily whenever the slot is read; the store runs no timers of its own.
///
/// # Implementation Notes
///
/// - `save` replaces, never appends
/// - Only `touch_activity` mutates a stored record, and only `last_activity`
/// - Reads that find an expired or inactive record clear the slot
pub trait SessionStore: Send + Sync {
    /// Persist a new session for `user`.
    ///
    /// `standard_roles` are the roles subject to the inactivity window; the
    /// record is flagged iff `user` holds one of them.
    ///
    /// # Errors
    ///
    /// Returns error if the record cannot be encoded or written.
    fn save(
        &self,
        user: &UserProfile,
        standard_roles: &[Role],
    ) -> impl Future<Output = Result<SessionRecord>> + Send;

    /// Record user activity now.
    ///
    /// # Returns
    ///
    /// The updated record, or `None` if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns error if the slot cannot be read or written.
    fn touch_activity(&self) -> impl Future<Output = Result<Option<SessionRecord>>> + Send;

    /// Evaluate the slot, clearing it if the session ran out.
    ///
    /// Expiry is checked before inactivity.
    ///
    /// # Errors
    ///
    /// Returns error if the slot cannot be read, decoded, or cleared.
    fn check(&self) -> impl Future<Output = Result<SessionStatus>> + Send;

    /// Empty the slot. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns error if the backend cannot be written.
    fn clear(&self) -> impl Future<Output = Result<()>> + Send;

    /// The current session, if one is stored and still valid.
    ///
    /// This is what the UI reads on page load to restore the logged-in user.
    ///
    /// # Errors
    ///
    /// Same as [`SessionStore::check`].
    fn get_current(&self) -> impl Future<Output = Result<Option<SessionRecord>>> + Send {
        async move { Ok(self.check().await?.into_active()) }
    }
}
