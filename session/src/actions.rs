//! Session monitor actions.
//!
//! Everything the monitor reacts to is an action:
//! - **Commands** from the host (`Restore`, `LoggedIn`, `UserChanged`, `Logout`)
//! - **Ticks** from the monitor's own timers and activity subscription
//! - **Results** of session store calls, fed back by effects
//!
//! Ticks and results carry the `epoch` they were issued in. The reducer
//! drops any that belong to an earlier monitoring run.

use crate::error::SessionError;
use crate::providers::ActivityKind;
use crate::state::{LogoutReason, SessionRecord, SessionStatus, UserProfile};

/// Session monitor action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorAction {
    // ═══════════════════════════════════════════════════════════════════════
    // Commands
    // ═══════════════════════════════════════════════════════════════════════
    /// Page load: read the stored session once and adopt it if still valid.
    Restore,

    /// Login succeeded.
    ///
    /// # Flow
    ///
    /// 1. Stop any running monitoring
    /// 2. Save a new record through the session store
    /// 3. `SessionSaved` starts monitoring, `SaveFailed` leaves the monitor idle
    LoggedIn {
        /// Authenticated user.
        user: UserProfile,
    },

    /// The UI's logged-in user changed.
    ///
    /// `Some` reconciles with the store (and starts monitoring if a valid
    /// record exists); `None` stops monitoring without a logout notice.
    UserChanged {
        /// New UI-side user.
        user: Option<UserProfile>,
    },

    /// End the session now.
    Logout {
        /// Usually [`LogoutReason::Manual`] or [`LogoutReason::Forced`].
        reason: LogoutReason,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Ticks
    // ═══════════════════════════════════════════════════════════════════════
    /// Validity check timer fired.
    ValidityTick {
        /// Monitoring run that started the timer.
        epoch: u64,
    },

    /// Heartbeat timer fired.
    HeartbeatTick {
        /// Monitoring run that started the timer.
        epoch: u64,
    },

    /// The activity source reported an interaction.
    ActivityDetected {
        /// Monitoring run that attached the listener.
        epoch: u64,
        /// What the user did.
        kind: ActivityKind,
    },

    // ═══════════════════════════════════════════════════════════════════════
    // Results
    // ═══════════════════════════════════════════════════════════════════════
    /// Login record persisted.
    SessionSaved {
        /// Epoch of the login.
        epoch: u64,
        /// The new record.
        record: SessionRecord,
    },

    /// Login record could not be persisted.
    SaveFailed {
        /// Epoch of the login.
        epoch: u64,
        /// Why.
        error: SessionError,
    },

    /// The store evaluated the slot.
    CheckCompleted {
        /// Epoch the check was issued in.
        epoch: u64,
        /// Outcome.
        status: SessionStatus,
    },

    /// The store could not evaluate the slot.
    CheckFailed {
        /// Epoch the check was issued in.
        epoch: u64,
        /// Why.
        error: SessionError,
    },

    /// Activity written.
    ActivityRecorded {
        /// Epoch the touch was issued in.
        epoch: u64,
        /// Updated record, `None` if the slot was empty.
        record: Option<SessionRecord>,
    },

    /// Activity could not be written.
    ActivityFailed {
        /// Epoch the touch was issued in.
        epoch: u64,
        /// Why.
        error: SessionError,
    },

    /// The store was cleared; hand the notice to the UI.
    LogoutCompleted {
        /// Epoch of the logout.
        epoch: u64,
        /// Why the session ended.
        reason: LogoutReason,
    },
}

impl MonitorAction {
    /// Epoch carried by ticks and results. Commands carry none.
    #[must_use]
    pub const fn epoch(&self) -> Option<u64> {
        match self {
            Self::Restore
            | Self::LoggedIn { .. }
            | Self::UserChanged { .. }
            | Self::Logout { .. } => None,
            Self::ValidityTick { epoch }
            | Self::HeartbeatTick { epoch }
            | Self::ActivityDetected { epoch, .. }
            | Self::SessionSaved { epoch, .. }
            | Self::SaveFailed { epoch, .. }
            | Self::CheckCompleted { epoch, .. }
            | Self::CheckFailed { epoch, .. }
            | Self::ActivityRecorded { epoch, .. }
            | Self::ActivityFailed { epoch, .. }
            | Self::LogoutCompleted { epoch, .. } => Some(*epoch),
        }
    }
}
