//! Session monitor reducer.
//!
//! Drives the session lifecycle:
//!
//! ```text
//! Idle ──LoggedIn/SessionSaved──▶ Monitoring ──Expired/Inactive/Absent──▶ LoggingOut
//!  ▲  ◀────────UserChanged(None)────────┘                                   │
//!  └──────────────────────────────LogoutCompleted───────────────────────────┘
//! ```
//!
//! While monitoring, two cancellable intervals run (validity check and
//! heartbeat), plus an activity subscription for inactivity-tracked
//! records. Every start or stop bumps `state.epoch` and cancels the
//! previous run's effects; anything fed back with an older epoch is dropped.

use crate::actions::MonitorAction;
use crate::constants::timers;
use crate::environment::MonitorEnvironment;
use crate::error::SessionError;
use crate::providers::{ActivitySource, LogoutNotifier, SessionStore};
use crate::state::{
    LogoutNotice, LogoutReason, MonitorPhase, MonitorState, SessionRecord, SessionStatus,
    UserProfile,
};
use futures::StreamExt;
use school_session_core::{Effect, Reducer, SmallVec, smallvec};
use std::sync::Arc;

/// Session monitor reducer.
///
/// Stateless: all state lives in [`MonitorState`], all dependencies in
/// [`MonitorEnvironment`].
pub struct SessionMonitor<S, A, N> {
    _phantom: std::marker::PhantomData<fn() -> (S, A, N)>,
}

impl<S, A, N> SessionMonitor<S, A, N> {
    /// Create a new session monitor.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<S, A, N> Default for SessionMonitor<S, A, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, A, N> Clone for SessionMonitor<S, A, N> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S, A, N> std::fmt::Debug for SessionMonitor<S, A, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMonitor").finish()
    }
}

type Effects = SmallVec<[Effect<MonitorAction>; 4]>;

impl<S, A, N> SessionMonitor<S, A, N>
where
    S: SessionStore + 'static,
    A: ActivitySource + 'static,
    N: LogoutNotifier + 'static,
{
    /// Cancel everything a monitoring run may have started.
    fn cancel_run() -> [Effect<MonitorAction>; 3] {
        [
            Effect::Cancel {
                id: timers::VALIDITY_CHECK,
            },
            Effect::Cancel {
                id: timers::ACTIVITY_HEARTBEAT,
            },
            Effect::Cancel {
                id: timers::ACTIVITY_LISTENERS,
            },
        ]
    }

    /// Enter `Monitoring` for `record`, replacing any previous run.
    fn start(
        state: &mut MonitorState,
        record: SessionRecord,
        env: &MonitorEnvironment<S, A, N>,
    ) -> Effects {
        state.epoch += 1;
        let epoch = state.epoch;
        let flagged = record.requires_inactivity_check;

        tracing::info!(
            user_id = %record.user.id,
            epoch,
            requires_inactivity_check = flagged,
            "Session monitoring started"
        );

        state.phase = MonitorPhase::Monitoring {
            user: record.user,
            requires_inactivity_check: flagged,
        };

        let mut effects: Vec<Effect<MonitorAction>> = Self::cancel_run().into();
        effects.push(
            Effect::Interval {
                period: env.config.check_interval(),
                action: Box::new(MonitorAction::ValidityTick { epoch }),
            }
            .cancellable(timers::VALIDITY_CHECK),
        );
        effects.push(
            Effect::Interval {
                period: env.config.heartbeat_interval(),
                action: Box::new(MonitorAction::HeartbeatTick { epoch }),
            }
            .cancellable(timers::ACTIVITY_HEARTBEAT),
        );

        state.listening = flagged;
        if flagged {
            effects.push(Self::listen(epoch, env).cancellable(timers::ACTIVITY_LISTENERS));
        }

        effects.into_iter().collect()
    }

    /// Leave `Monitoring` without any logout side effect.
    fn stop(state: &mut MonitorState) -> Effects {
        state.epoch += 1;
        state.phase = MonitorPhase::Idle;
        state.listening = false;
        tracing::info!(epoch = state.epoch, "Session monitoring stopped");
        Self::cancel_run().into_iter().collect()
    }

    /// Stop timers and listeners, then clear the store.
    fn begin_logout(
        state: &mut MonitorState,
        reason: LogoutReason,
        env: &MonitorEnvironment<S, A, N>,
    ) -> Effects {
        state.epoch += 1;
        let epoch = state.epoch;
        state.phase = MonitorPhase::LoggingOut { reason };
        state.listening = false;

        tracing::info!(%reason, epoch, "Logging out");

        let sessions = Arc::clone(&env.sessions);
        let mut effects: Effects = Self::cancel_run().into_iter().collect();
        effects.push(Effect::Future(Box::pin(async move {
            if let Err(error) = sessions.clear().await {
                tracing::warn!(%error, "Failed to clear session during logout");
                metrics::counter!("session.storage_errors", "operation" => "clear").increment(1);
            }
            Some(MonitorAction::LogoutCompleted { epoch, reason })
        })));
        effects
    }

    /// Subscribe to the activity source for the run `epoch`.
    ///
    /// The listener attaches when the effect starts running and detaches
    /// when it is cancelled.
    fn listen(epoch: u64, env: &MonitorEnvironment<S, A, N>) -> Effect<MonitorAction> {
        let activity = Arc::clone(&env.activity);
        Effect::Stream(Box::pin(async_stream::stream! {
            let mut events = activity.subscribe();
            while let Some(kind) = events.next().await {
                yield MonitorAction::ActivityDetected { epoch, kind };
            }
        }))
    }

    /// Persist a new session for `user`.
    fn save(
        epoch: u64,
        user: UserProfile,
        env: &MonitorEnvironment<S, A, N>,
    ) -> Effect<MonitorAction> {
        let sessions = Arc::clone(&env.sessions);
        let standard_roles = env.config.inactivity_roles.clone();
        Effect::Future(Box::pin(async move {
            Some(match sessions.save(&user, &standard_roles).await {
                Ok(record) => MonitorAction::SessionSaved { epoch, record },
                Err(error) => MonitorAction::SaveFailed { epoch, error },
            })
        }))
    }

    /// Evaluate the stored session.
    fn check(epoch: u64, env: &MonitorEnvironment<S, A, N>) -> Effect<MonitorAction> {
        let sessions = Arc::clone(&env.sessions);
        Effect::Future(Box::pin(async move {
            Some(match sessions.check().await {
                Ok(status) => MonitorAction::CheckCompleted { epoch, status },
                Err(error) => MonitorAction::CheckFailed { epoch, error },
            })
        }))
    }

    /// Record activity now.
    fn touch(epoch: u64, env: &MonitorEnvironment<S, A, N>) -> Effect<MonitorAction> {
        let sessions = Arc::clone(&env.sessions);
        Effect::Future(Box::pin(async move {
            Some(match sessions.touch_activity().await {
                Ok(record) => MonitorAction::ActivityRecorded { epoch, record },
                Err(error) => MonitorAction::ActivityFailed { epoch, error },
            })
        }))
    }

    /// Bring the monitor in line with what the store reports.
    ///
    /// The store is the source of truth: a valid record the monitor does not
    /// track is adopted, a lapsed or missing one ends the monitored session.
    fn reconcile(
        state: &mut MonitorState,
        status: SessionStatus,
        env: &MonitorEnvironment<S, A, N>,
    ) -> Effects {
        let tracked = match &state.phase {
            MonitorPhase::Idle => None,
            MonitorPhase::Monitoring {
                user,
                requires_inactivity_check,
            } => Some((user.id.clone(), *requires_inactivity_check)),
            MonitorPhase::LoggingOut { .. } => return smallvec![Effect::None],
        };

        match (tracked, status) {
            (None, SessionStatus::Active(record)) => {
                tracing::info!(user_id = %record.user.id, "Adopting stored session");
                Self::start(state, record, env)
            },
            (None, status) => {
                tracing::debug!(?status, "No session to adopt");
                smallvec![Effect::None]
            },
            (Some((user_id, flagged)), SessionStatus::Active(record)) => {
                if record.user.id == user_id && record.requires_inactivity_check == flagged {
                    return smallvec![Effect::None];
                }
                tracing::info!(
                    previous = %user_id,
                    user_id = %record.user.id,
                    "Stored session changed, adopting it"
                );
                Self::start(state, record, env)
            },
            (Some(_), status) => match status.logout_reason() {
                Some(reason) => Self::begin_logout(state, reason, env),
                None => smallvec![Effect::None],
            },
        }
    }

    /// Log a swallowed storage failure.
    fn storage_failure(operation: &'static str, error: &SessionError) -> Effects {
        tracing::warn!(operation, %error, "Session storage failure, retrying on next tick");
        metrics::counter!("session.storage_errors", "operation" => operation).increment(1);
        smallvec![Effect::None]
    }
}

impl<S, A, N> Reducer for SessionMonitor<S, A, N>
where
    S: SessionStore + 'static,
    A: ActivitySource + 'static,
    N: LogoutNotifier + 'static,
{
    type State = MonitorState;
    type Action = MonitorAction;
    type Environment = MonitorEnvironment<S, A, N>;

    #[allow(clippy::too_many_lines)] // One arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        if let Some(epoch) = action.epoch() {
            if epoch != state.epoch {
                tracing::trace!(epoch, current = state.epoch, "Dropping stale action");
                return smallvec![Effect::None];
            }
        }

        match action {
            // ═══════════════════════════════════════════════════════════════
            // Restore: page load, adopt a valid stored session
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::Restore => smallvec![Self::check(state.epoch, env)],

            // ═══════════════════════════════════════════════════════════════
            // LoggedIn: persist the new session, then start monitoring
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::LoggedIn { user } => {
                if matches!(state.phase, MonitorPhase::LoggingOut { .. }) {
                    // The clear in flight would wipe a record saved now.
                    tracing::info!(user_id = %user.id, "Login queued until logout completes");
                    state.pending_login = Some(user);
                    return smallvec![Effect::None];
                }

                let mut effects = if state.is_monitoring() {
                    Self::stop(state)
                } else {
                    state.epoch += 1;
                    state.phase = MonitorPhase::Idle;
                    SmallVec::new()
                };
                effects.push(Self::save(state.epoch, user, env));
                effects
            },

            MonitorAction::SessionSaved { record, .. } => match state.phase {
                MonitorPhase::Idle => Self::start(state, record, env),
                MonitorPhase::Monitoring { .. } | MonitorPhase::LoggingOut { .. } => {
                    smallvec![Effect::None]
                },
            },

            MonitorAction::SaveFailed { error, .. } => {
                tracing::warn!(%error, "Failed to save session after login");
                metrics::counter!("session.storage_errors", "operation" => "save").increment(1);
                smallvec![Effect::None]
            },

            // ═══════════════════════════════════════════════════════════════
            // UserChanged: UI-side user state moved
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::UserChanged { user: None } => {
                state.pending_login = None;
                if state.is_monitoring() {
                    Self::stop(state)
                } else {
                    smallvec![Effect::None]
                }
            },

            MonitorAction::UserChanged { user: Some(user) } => {
                if state.current_user().is_some_and(|current| current.id == user.id) {
                    smallvec![Effect::None]
                } else {
                    smallvec![Self::check(state.epoch, env)]
                }
            },

            // ═══════════════════════════════════════════════════════════════
            // Logout: explicit or forced
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::Logout { reason } => match state.phase {
                MonitorPhase::LoggingOut { .. } => {
                    state.pending_login = None;
                    smallvec![Effect::None]
                },
                MonitorPhase::Idle | MonitorPhase::Monitoring { .. } => {
                    Self::begin_logout(state, reason, env)
                },
            },

            MonitorAction::LogoutCompleted { reason, .. } => {
                if !matches!(state.phase, MonitorPhase::LoggingOut { .. }) {
                    return smallvec![Effect::None];
                }

                let notice = LogoutNotice::new(reason, env.config.login_route.clone());
                state.phase = MonitorPhase::Idle;
                state.last_notice = Some(notice.clone());

                tracing::info!(%reason, redirect_to = %notice.redirect_to, "Logged out");
                metrics::counter!("session.logout", "reason" => reason.as_str()).increment(1);

                let notifier = Arc::clone(&env.notifier);
                let mut effects: Effects = smallvec![Effect::Future(Box::pin(async move {
                    notifier.notify(notice);
                    None
                }))];

                if let Some(user) = state.pending_login.take() {
                    state.epoch += 1;
                    tracing::info!(user_id = %user.id, "Resuming queued login");
                    effects.push(Self::save(state.epoch, user, env));
                }
                effects
            },

            // ═══════════════════════════════════════════════════════════════
            // Ticks
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::ValidityTick { epoch } => {
                if !state.is_monitoring() {
                    return smallvec![Effect::None];
                }
                tracing::trace!(epoch, "Validity check");
                smallvec![Self::check(epoch, env)]
            },

            MonitorAction::HeartbeatTick { epoch } => {
                if !state.is_monitoring() {
                    return smallvec![Effect::None];
                }
                tracing::trace!(epoch, "Activity heartbeat");
                smallvec![Self::touch(epoch, env)]
            },

            MonitorAction::ActivityDetected { epoch, kind } => match state.phase {
                MonitorPhase::Monitoring {
                    requires_inactivity_check: true,
                    ..
                } => {
                    tracing::trace!(epoch, ?kind, "User activity");
                    smallvec![Self::touch(epoch, env)]
                },
                _ => smallvec![Effect::None],
            },

            // ═══════════════════════════════════════════════════════════════
            // Store results
            // ═══════════════════════════════════════════════════════════════
            MonitorAction::CheckCompleted { status, .. } => Self::reconcile(state, status, env),

            MonitorAction::CheckFailed { error, .. } => Self::storage_failure("check", &error),

            MonitorAction::ActivityRecorded { record, .. } => {
                if record.is_none() {
                    tracing::debug!("Activity recorded against an empty slot");
                }
                smallvec![Effect::None]
            },

            MonitorAction::ActivityFailed { error, .. } => Self::storage_failure("touch", &error),
        }
    }
}
