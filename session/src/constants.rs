//! Session tracking constants.

/// Interval between two validity checks, in milliseconds.
pub const VALIDITY_CHECK_INTERVAL_MS: u64 = 5_000;

/// Interval between two activity heartbeats, in milliseconds.
pub const ACTIVITY_HEARTBEAT_INTERVAL_MS: u64 = 15_000;

/// Default absolute session lifetime, in minutes.
pub const DEFAULT_SESSION_DURATION_MINUTES: u32 = 60;

/// Idle window for inactivity-tracked roles, in minutes.
pub const INACTIVITY_TIMEOUT_MINUTES: u32 = 3;

/// Roles subject to the inactivity window unless configured otherwise.
pub const DEFAULT_INACTIVITY_ROLES: &[&str] = &["caisse"];

/// Storage slot holding the current session record.
pub const DEFAULT_STORAGE_KEY: &str = "currentUser";

/// Route the UI navigates to after a logout.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Environment variables read by [`SessionConfig::from_env`](crate::SessionConfig::from_env).
pub mod env_vars {
    /// Absolute session lifetime in minutes.
    pub const SESSION_DURATION_MINUTES: &str = "SESSION_DURATION_MINUTES";

    /// Inactivity window in minutes.
    pub const SESSION_INACTIVITY_MINUTES: &str = "SESSION_INACTIVITY_MINUTES";

    /// Comma separated list of inactivity-tracked roles.
    pub const SESSION_STANDARD_ROLES: &str = "SESSION_STANDARD_ROLES";
}

/// Cancellation ids of the monitor's long-running effects.
pub mod timers {
    use school_session_core::effect::EffectId;

    /// Repeating validity check.
    pub const VALIDITY_CHECK: EffectId = EffectId::new("session.validity_check");

    /// Repeating activity heartbeat.
    pub const ACTIVITY_HEARTBEAT: EffectId = EffectId::new("session.activity_heartbeat");

    /// Subscription to the activity source.
    pub const ACTIVITY_LISTENERS: EffectId = EffectId::new("session.activity_listeners");
}
