//! Session state types.
//!
//! The persisted record ([`SessionRecord`]) and the monitor's in-memory
//! state ([`MonitorState`]). All types are `Clone` so they can flow through
//! actions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
// User Types
// ═══════════════════════════════════════════════════════════════════════

/// Identifier of an application user, as issued by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Create a user id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role name such as `"admin"` or `"caisse"`.
///
/// Compared case-sensitively, as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(pub String);

impl Role {
    /// Create a role.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The role name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Authenticated user profile.
///
/// Opaque to the tracker apart from `roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Backend user id.
    pub id: UserId,

    /// Login email.
    pub email: String,

    /// Name shown in the dashboard header.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserProfile {
    /// Create a profile with the given roles.
    ///
    /// # Examples
    ///
    /// ```
    /// # use school_session::{UserProfile, Role};
    /// let cashier = UserProfile::new("42", "cashier@school.test", ["caisse"]);
    /// assert!(cashier.has_any_role(&[Role::new("caisse")]));
    /// ```
    #[must_use]
    pub fn new<I, R>(id: impl Into<String>, email: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<Role>,
    {
        Self {
            id: UserId::new(id),
            email: email.into(),
            display_name: None,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether the user holds at least one of `roles`.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        self.roles.iter().any(|role| roles.contains(role))
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Persisted Record
// ═══════════════════════════════════════════════════════════════════════

/// The single persisted session.
///
/// Timestamps are stored as integer milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    /// Logged-in user.
    pub user: UserProfile,

    /// Beyond this instant the session is invalid regardless of activity.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub expires_at: DateTime<Utc>,

    /// Last recorded user activity (heartbeat or interaction).
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub last_activity: DateTime<Utc>,

    /// Computed once at save time from the user's roles.
    pub requires_inactivity_check: bool,
}

impl SessionRecord {
    /// Whether the absolute lifetime has run out at `now`.
    ///
    /// The session is still valid at exactly `expires_at`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whether the inactivity window has run out at `now`.
    ///
    /// Always `false` for records that are not inactivity-tracked.
    #[must_use]
    pub fn is_inactive_at(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.requires_inactivity_check && now - self.last_activity > timeout
    }
}

/// Outcome of evaluating the stored slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    /// A valid record.
    Active(SessionRecord),

    /// The record outlived `expires_at` and was cleared.
    Expired,

    /// The record exceeded the inactivity window and was cleared.
    Inactive,

    /// Nothing stored.
    Absent,
}

impl SessionStatus {
    /// The record if the session is active.
    #[must_use]
    pub fn into_active(self) -> Option<SessionRecord> {
        match self {
            Self::Active(record) => Some(record),
            Self::Expired | Self::Inactive | Self::Absent => None,
        }
    }

    /// Why a monitored session ends with this status, if it does.
    ///
    /// A record that disappeared is treated as expired: another tab or an
    /// earlier read already dropped it.
    #[must_use]
    pub const fn logout_reason(&self) -> Option<LogoutReason> {
        match self {
            Self::Active(_) => None,
            Self::Expired | Self::Absent => Some(LogoutReason::Expired),
            Self::Inactive => Some(LogoutReason::Inactivity),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Logout
// ═══════════════════════════════════════════════════════════════════════

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogoutReason {
    /// Absolute lifetime exceeded.
    Expired,

    /// Inactivity window exceeded.
    Inactivity,

    /// The user logged out.
    Manual,

    /// The application closed the session (e.g. revoked account).
    Forced,
}

impl LogoutReason {
    /// Stable identifier, used as a metrics label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Inactivity => "inactivity",
            Self::Manual => "manual",
            Self::Forced => "forced",
        }
    }

    /// Message shown to the user in the logout toast.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Expired => "Your session has expired. Please log in again.",
            Self::Inactivity => "You were logged out due to inactivity.",
            Self::Manual => "You have been logged out.",
            Self::Forced => "Your session was closed.",
        }
    }
}

impl fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One-shot notification handed to the UI when a session ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogoutNotice {
    /// Why the session ended.
    pub reason: LogoutReason,

    /// Human readable message for the toast or banner.
    pub message: String,

    /// Route to navigate to.
    pub redirect_to: String,
}

impl LogoutNotice {
    /// Build the notice for `reason`, redirecting to `login_route`.
    #[must_use]
    pub fn new(reason: LogoutReason, login_route: impl Into<String>) -> Self {
        Self {
            reason,
            message: reason.message().to_string(),
            redirect_to: login_route.into(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Monitor State
// ═══════════════════════════════════════════════════════════════════════

/// Lifecycle phase of the session monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum MonitorPhase {
    /// Nobody logged in, no timers running.
    #[default]
    Idle,

    /// A user is logged in and timers are running.
    Monitoring {
        /// The logged-in user.
        user: UserProfile,
        /// Copied from the record; decides whether activity listeners run.
        requires_inactivity_check: bool,
    },

    /// Timers stopped, store being cleared.
    LoggingOut {
        /// Why the session is ending.
        reason: LogoutReason,
    },
}

/// State owned by the [`SessionMonitor`](crate::SessionMonitor) reducer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorState {
    /// Current phase.
    pub phase: MonitorPhase,

    /// Bumped every time monitoring starts or stops.
    ///
    /// Ticks and storage results carry the epoch they were issued in;
    /// anything from an older epoch is dropped.
    pub epoch: u64,

    /// Whether the activity subscription is running.
    pub listening: bool,

    /// Last notice handed to the UI.
    pub last_notice: Option<LogoutNotice>,

    /// Login received while a logout was still clearing the store.
    ///
    /// Saved once the logout completes.
    pub pending_login: Option<UserProfile>,
}

impl MonitorState {
    /// The user the monitor believes is logged in.
    #[must_use]
    pub const fn current_user(&self) -> Option<&UserProfile> {
        match &self.phase {
            MonitorPhase::Monitoring { user, .. } => Some(user),
            MonitorPhase::Idle | MonitorPhase::LoggingOut { .. } => None,
        }
    }

    /// Whether timers are running.
    #[must_use]
    pub const fn is_monitoring(&self) -> bool {
        matches!(self.phase, MonitorPhase::Monitoring { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(flagged: bool) -> SessionRecord {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).single().unwrap_or_default();
        SessionRecord {
            user: UserProfile::new("1", "a@school.test", ["caisse"]),
            expires_at: now + chrono::Duration::minutes(60),
            last_activity: now,
            requires_inactivity_check: flagged,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let record = record(false);
        assert!(!record.is_expired_at(record.expires_at));
        assert!(record.is_expired_at(record.expires_at + chrono::Duration::milliseconds(1)));
    }

    #[test]
    fn inactivity_only_applies_to_flagged_records() {
        let timeout = chrono::Duration::minutes(3);
        let later = record(true).last_activity + chrono::Duration::minutes(4);
        assert!(record(true).is_inactive_at(later, timeout));
        assert!(!record(false).is_inactive_at(later, timeout));
    }

    #[test]
    fn record_serializes_with_millisecond_timestamps() {
        let record = record(true);
        let json = serde_json::to_value(&record).unwrap_or_default();
        assert_eq!(json["lastActivity"], record.last_activity.timestamp_millis());
        assert_eq!(json["requiresInactivityCheck"], true);
        assert_eq!(json["user"]["roles"][0], "caisse");
        assert!(json["user"].get("displayName").is_none());
    }

    #[test]
    fn absent_record_maps_to_expired_logout() {
        assert_eq!(SessionStatus::Absent.logout_reason(), Some(LogoutReason::Expired));
        assert_eq!(SessionStatus::Inactive.logout_reason(), Some(LogoutReason::Inactivity));
        assert_eq!(SessionStatus::Active(record(false)).logout_reason(), None);
    }

    #[test]
    fn notice_carries_message_and_route() {
        let notice = LogoutNotice::new(LogoutReason::Inactivity, "/login");
        assert_eq!(notice.message, "You were logged out due to inactivity.");
        assert_eq!(notice.redirect_to, "/login");
    }
}
