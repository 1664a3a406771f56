//! Session tracking configuration.
//!
//! Values come from the application (or the environment), never from the
//! reducer itself. Defaults match the dashboard's production settings:
//! 60 minute sessions, 3 minute inactivity window for cashier roles,
//! 5 s validity checks and 15 s heartbeats.
//!
//! # Example
//!
//! ```
//! use school_session::SessionConfig;
//!
//! let config = SessionConfig::default()
//!     .with_session_duration_minutes(90)
//!     .with_inactivity_roles(["caisse", "comptable"]);
//!
//! assert!(config.validate().is_ok());
//! assert_eq!(config.session_duration(), chrono::Duration::minutes(90));
//! ```

use crate::constants::{
    ACTIVITY_HEARTBEAT_INTERVAL_MS, DEFAULT_INACTIVITY_ROLES, DEFAULT_LOGIN_ROUTE,
    DEFAULT_SESSION_DURATION_MINUTES, DEFAULT_STORAGE_KEY, INACTIVITY_TIMEOUT_MINUTES,
    VALIDITY_CHECK_INTERVAL_MS, env_vars,
};
use crate::state::Role;
use crate::stores::SessionPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be parsed.
    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name
        var: String,
        /// Raw value
        value: String,
    },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Session tracking configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Absolute session lifetime in minutes.
    ///
    /// Default: 60
    pub session_duration_minutes: u32,

    /// Idle window for inactivity-tracked roles, in minutes.
    ///
    /// Default: 3
    pub inactivity_timeout_minutes: u32,

    /// Validity check interval in milliseconds.
    ///
    /// Default: 5 000
    pub check_interval_ms: u64,

    /// Activity heartbeat interval in milliseconds.
    ///
    /// Default: 15 000
    pub heartbeat_interval_ms: u64,

    /// Roles subject to the inactivity window.
    ///
    /// Default: `["caisse"]`
    pub inactivity_roles: Vec<Role>,

    /// Route the UI navigates to after logout.
    pub login_route: String,

    /// Storage slot holding the session record.
    pub storage_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_duration_minutes: DEFAULT_SESSION_DURATION_MINUTES,
            inactivity_timeout_minutes: INACTIVITY_TIMEOUT_MINUTES,
            check_interval_ms: VALIDITY_CHECK_INTERVAL_MS,
            heartbeat_interval_ms: ACTIVITY_HEARTBEAT_INTERVAL_MS,
            inactivity_roles: DEFAULT_INACTIVITY_ROLES.iter().copied().map(Role::from).collect(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from process environment variables
    ///
    /// Reads `SESSION_DURATION_MINUTES`, `SESSION_INACTIVITY_MINUTES` and
    /// `SESSION_STANDARD_ROLES`; unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set to an unparsable value or the
    /// resulting configuration is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// Same as [`SessionConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(env_vars::SESSION_DURATION_MINUTES) {
            config.session_duration_minutes =
                parse_minutes(env_vars::SESSION_DURATION_MINUTES, &raw)?;
        }

        if let Some(raw) = lookup(env_vars::SESSION_INACTIVITY_MINUTES) {
            config.inactivity_timeout_minutes =
                parse_minutes(env_vars::SESSION_INACTIVITY_MINUTES, &raw)?;
        }

        if let Some(raw) = lookup(env_vars::SESSION_STANDARD_ROLES) {
            config.inactivity_roles = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(Role::from)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if a duration is zero, or if either timer interval is
    /// not shorter than the inactivity window (the heartbeat would then
    /// never keep a flagged session alive).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.session_duration_minutes == 0 {
            return Err(ConfigError::Validation(
                "session duration must be at least one minute".to_string(),
            ));
        }
        if self.inactivity_timeout_minutes == 0 {
            return Err(ConfigError::Validation(
                "inactivity timeout must be at least one minute".to_string(),
            ));
        }
        if self.check_interval_ms == 0 || self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "timer intervals must be positive".to_string(),
            ));
        }

        let window = self.inactivity_timeout();
        if self.check_interval() >= window || self.heartbeat_interval() >= window {
            return Err(ConfigError::Validation(format!(
                "check ({} ms) and heartbeat ({} ms) intervals must be shorter than \
                 the {} minute inactivity timeout",
                self.check_interval_ms, self.heartbeat_interval_ms, self.inactivity_timeout_minutes
            )));
        }

        if self.storage_key.is_empty() {
            return Err(ConfigError::Validation("storage key must not be empty".to_string()));
        }

        Ok(())
    }

    /// Set session lifetime.
    #[must_use]
    pub const fn with_session_duration_minutes(mut self, minutes: u32) -> Self {
        self.session_duration_minutes = minutes;
        self
    }

    /// Set inactivity window.
    #[must_use]
    pub const fn with_inactivity_timeout_minutes(mut self, minutes: u32) -> Self {
        self.inactivity_timeout_minutes = minutes;
        self
    }

    /// Set inactivity-tracked roles.
    #[must_use]
    pub fn with_inactivity_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        self.inactivity_roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// Set storage slot key.
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Absolute session lifetime.
    #[must_use]
    pub fn session_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.session_duration_minutes))
    }

    /// Inactivity window.
    #[must_use]
    pub const fn inactivity_timeout(&self) -> Duration {
        Duration::from_secs(self.inactivity_timeout_minutes as u64 * 60)
    }

    /// Validity check interval.
    #[must_use]
    pub const fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    /// Heartbeat interval.
    #[must_use]
    pub const fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Expiry rules for the session store.
    #[must_use]
    pub fn policy(&self) -> SessionPolicy {
        SessionPolicy::new(
            self.session_duration(),
            chrono::Duration::minutes(i64::from(self.inactivity_timeout_minutes)),
        )
    }
}

fn parse_minutes(var: &str, raw: &str) -> Result<u32, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.to_string(),
    })
}
