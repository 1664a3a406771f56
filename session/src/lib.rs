//! # School Session
//!
//! Session lifetime and inactivity logout tracking for the school
//! administration dashboard.
//!
//! ## Features
//!
//! - **Single-slot persistence**: one current session record, replaced on login
//! - **Lazy expiry**: expiry and inactivity are evaluated when the record is read
//! - **Inactivity tracking**: cashier-type roles are logged out after 3 idle minutes
//! - **Testable**: clock, storage, activity and notification are all injected
//!
//! ## Architecture
//!
//! The monitor is a reducer; timers, storage calls and activity subscriptions
//! are effects executed by the runtime store:
//!
//! ```text
//! LoggedIn → SessionSaved → Monitoring ─┬─ ValidityTick (5 s) → check() → CheckCompleted
//!                                       ├─ HeartbeatTick (15 s) → touch_activity()
//!                                       └─ ActivityDetected → touch_activity()
//! CheckCompleted(Expired | Inactive | Absent) → LoggingOut → clear() → LogoutCompleted → Idle
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use school_session::*;
//! use school_session_runtime::Store;
//!
//! let config = SessionConfig::from_env()?;
//! let sessions = Arc::new(PersistentSessionStore::new(
//!     FileStorage::new(data_dir),
//!     SystemClock,
//!     config.policy(),
//! ));
//! let (notifier, mut notices) = ChannelNotifier::new();
//! let hub = Arc::new(ActivityHub::new());
//! let env = MonitorEnvironment::new(sessions, hub, Arc::new(notifier), config);
//!
//! let store = Store::new(MonitorState::default(), SessionMonitor::new(), env);
//! store.send(MonitorAction::Restore).await?;
//!
//! if let Some(notice) = notices.recv().await {
//!     println!("{} → {}", notice.message, notice.redirect_to);
//! }
//! ```

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

// Public modules
pub mod actions;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod providers;
pub mod reducers;
pub mod state;
pub mod stores;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

// Re-export main types for convenience
pub use actions::MonitorAction;
pub use config::{ConfigError, SessionConfig};
pub use environment::MonitorEnvironment;
pub use error::{Result, SessionError};
pub use providers::{
    ActivityHub, ActivityKind, ActivitySource, ActivityStream, ChannelNotifier, LogoutNotifier,
    SessionStorage, SessionStore,
};
pub use reducers::SessionMonitor;
pub use state::{
    LogoutNotice, LogoutReason, MonitorPhase, MonitorState, Role, SessionRecord, SessionStatus,
    UserId, UserProfile,
};
pub use stores::{FileStorage, MemoryStorage, PersistentSessionStore, SessionPolicy};
