//! Session tracking providers.
//!
//! Traits for every external dependency of the monitor, plus the small
//! production implementations that ship with the crate.
//!
//! # Architecture
//!
//! Providers are **interfaces**. The reducer depends only on these traits;
//! the application wires concrete implementations into the environment:
//!
//! ```text
//! ┌──────────────────┐   check / touch / clear   ┌─────────────────────────┐
//! │ SessionMonitor   │ ────────────────────────▶ │ SessionStore            │
//! │ (reducer)        │                           │  └─ SessionStorage slot │
//! │                  │ ◀──── ActivityKind ────── │ ActivitySource          │
//! │                  │ ───── LogoutNotice ─────▶ │ LogoutNotifier (UI)     │
//! └──────────────────┘                           └─────────────────────────┘
//! ```
//!
//! This enables:
//! - **Testing**: in-memory storage, fault-injecting stores, recording notifiers
//! - **Production**: file-backed storage, host-fed activity hub, channel notifier

pub mod activity;
pub mod notifier;
pub mod session;
pub mod storage;

pub use activity::{ActivityHub, ActivityKind, ActivitySource, ActivityStream};
pub use notifier::{ChannelNotifier, LogoutNotifier};
pub use session::SessionStore;
pub use storage::SessionStorage;
