//! Session monitor environment.
//!
//! Dependencies injected into the [`SessionMonitor`](crate::SessionMonitor).

use crate::config::SessionConfig;
use crate::providers::{ActivitySource, LogoutNotifier, SessionStore};
use std::sync::Arc;

/// Session monitor environment.
///
/// # Type Parameters
///
/// - `S`: Session store
/// - `A`: Activity source
/// - `N`: Logout notifier
pub struct MonitorEnvironment<S, A, N>
where
    S: SessionStore,
    A: ActivitySource,
    N: LogoutNotifier,
{
    /// Single-slot session store.
    pub sessions: Arc<S>,

    /// User activity source.
    pub activity: Arc<A>,

    /// Logout notice sink.
    pub notifier: Arc<N>,

    /// Timing and role configuration.
    pub config: SessionConfig,
}

impl<S, A, N> MonitorEnvironment<S, A, N>
where
    S: SessionStore,
    A: ActivitySource,
    N: LogoutNotifier,
{
    /// Create a new monitor environment.
    #[must_use]
    pub const fn new(
        sessions: Arc<S>,
        activity: Arc<A>,
        notifier: Arc<N>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions,
            activity,
            notifier,
            config,
        }
    }
}

impl<S, A, N> Clone for MonitorEnvironment<S, A, N>
where
    S: SessionStore,
    A: ActivitySource,
    N: LogoutNotifier,
{
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
            activity: Arc::clone(&self.activity),
            notifier: Arc::clone(&self.notifier),
            config: self.config.clone(),
        }
    }
}
