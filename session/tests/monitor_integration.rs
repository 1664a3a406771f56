//! Session monitor driven by the runtime store on a paused tokio clock.
//!
//! Timers run for real against tokio's test clock; `TokioClock` keeps the
//! session store's wall clock in step with it.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use chrono::Duration as ChronoDuration;
use school_session::constants::timers;
use school_session::mocks::{MockSessionStore, RecordingNotifier};
use school_session::{
    ActivityHub, ActivityKind, LogoutReason, MonitorAction, MonitorEnvironment, MonitorPhase,
    MonitorState, SessionConfig, SessionMonitor, SessionStore, UserProfile,
};
use school_session_runtime::Store;
use school_session_testing::{TokioClock, init_tracing, test_clock};
use school_session_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

type Sessions = MockSessionStore<TokioClock>;
type Monitor = SessionMonitor<Sessions, ActivityHub, RecordingNotifier>;
type Env = MonitorEnvironment<Sessions, ActivityHub, RecordingNotifier>;

struct Harness {
    store: Store<MonitorState, MonitorAction, Env, Monitor>,
    sessions: Arc<Sessions>,
    hub: Arc<ActivityHub>,
    notifier: Arc<RecordingNotifier>,
    clock: TokioClock,
}

impl Harness {
    fn new() -> Self {
        init_tracing();
        let clock = TokioClock::new(test_clock().now());
        let sessions = Arc::new(MockSessionStore::new(clock.clone()));
        let hub = Arc::new(ActivityHub::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let env = MonitorEnvironment::new(
            Arc::clone(&sessions),
            Arc::clone(&hub),
            Arc::clone(&notifier),
            SessionConfig::default(),
        );

        Self {
            store: Store::new(MonitorState::default(), SessionMonitor::new(), env),
            sessions,
            hub,
            notifier,
            clock,
        }
    }

    async fn send(&self, action: MonitorAction) {
        self.store.send(action).await.unwrap();
        self.store.settle().await;
    }

    async fn login(&self, user: UserProfile) {
        self.send(MonitorAction::LoggedIn { user }).await;
    }

    /// Let simulated time pass in validity-check sized steps.
    async fn run_for(&self, total: Duration) {
        let step = Duration::from_secs(5);
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            tokio::time::advance(step).await;
            self.store.settle().await;
            elapsed += step;
        }
    }

    /// Yield to spawned tasks without waiting for effects to finish.
    ///
    /// Storage calls parked at a gate keep `settle` from returning.
    async fn spin(&self) {
        for _ in 0..50 {
            tokio::task::yield_now().await;
        }
    }

    /// Yield until a storage call is parked at the gate.
    async fn until_parked(&self) {
        for _ in 0..1_000 {
            if self.sessions.gate().parked() > 0 {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("no storage call reached the gate");
    }

    async fn phase(&self) -> MonitorPhase {
        self.store.state(|s| s.phase.clone()).await
    }

    async fn listening(&self) -> bool {
        self.store.state(|s| s.listening).await
    }

    fn timers_running(&self) -> usize {
        self.store.running_tasks(timers::VALIDITY_CHECK)
            + self.store.running_tasks(timers::ACTIVITY_HEARTBEAT)
            + self.store.running_tasks(timers::ACTIVITY_LISTENERS)
    }

    fn reasons(&self) -> Vec<LogoutReason> {
        self.notifier.notices().iter().map(|n| n.reason).collect()
    }
}

fn admin() -> UserProfile {
    UserProfile::new("10", "admin@school.test", ["admin"])
}

fn cashier() -> UserProfile {
    UserProfile::new("20", "cashier@school.test", ["caisse"])
}

// ═══════════════════════════════════════════════════════════════════════
// Starting
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn cashier_login_starts_timers_and_one_listener() {
    let h = Harness::new();
    h.login(cashier()).await;

    assert!(matches!(
        h.phase().await,
        MonitorPhase::Monitoring { requires_inactivity_check: true, .. }
    ));
    assert!(h.listening().await);
    assert_eq!(h.store.running_tasks(timers::VALIDITY_CHECK), 1);
    assert_eq!(h.store.running_tasks(timers::ACTIVITY_HEARTBEAT), 1);
    assert_eq!(h.store.running_tasks(timers::ACTIVITY_LISTENERS), 1);
    assert_eq!(h.hub.listener_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn admin_login_attaches_no_listener() {
    let h = Harness::new();
    h.login(admin()).await;

    assert!(matches!(
        h.phase().await,
        MonitorPhase::Monitoring { requires_inactivity_check: false, .. }
    ));
    assert!(!h.listening().await);
    assert_eq!(h.store.running_tasks(timers::ACTIVITY_LISTENERS), 0);
    assert_eq!(h.hub.listener_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_save_leaves_monitor_idle() {
    let h = Harness::new();
    h.sessions.fail_saves(true);
    h.login(cashier()).await;

    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert_eq!(h.timers_running(), 0);
    assert!(h.reasons().is_empty());
}

#[tokio::test(start_paused = true)]
async fn repeated_login_never_double_registers() {
    let h = Harness::new();
    h.login(cashier()).await;
    h.login(cashier()).await;
    h.send(MonitorAction::Restore).await;
    h.send(MonitorAction::UserChanged { user: Some(cashier()) }).await;

    assert_eq!(h.hub.listener_count(), 1);
    assert_eq!(h.store.running_tasks(timers::ACTIVITY_LISTENERS), 1);
    assert_eq!(h.store.running_tasks(timers::VALIDITY_CHECK), 1);

    let checks_before = h.sessions.check_count();
    h.run_for(Duration::from_secs(5)).await;
    assert_eq!(h.sessions.check_count() - checks_before, 1);
}

// ═══════════════════════════════════════════════════════════════════════
// Expiry and inactivity
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn admin_is_logged_out_once_the_hour_is_up() {
    let h = Harness::new();
    h.login(admin()).await;

    h.run_for(Duration::from_secs(60 * 60)).await;
    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert!(h.reasons().is_empty());

    h.run_for(Duration::from_secs(60)).await;
    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert_eq!(h.reasons(), vec![LogoutReason::Expired]);
    assert_eq!(
        h.notifier.notices()[0].message,
        "Your session has expired. Please log in again."
    );
    assert_eq!(h.notifier.notices()[0].redirect_to, "/login");
    assert!(h.sessions.peek().await.unwrap().is_none());
    assert_eq!(h.timers_running(), 0);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_keeps_idle_cashier_logged_in() {
    let h = Harness::new();
    h.login(cashier()).await;

    h.run_for(Duration::from_secs(10 * 60)).await;

    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert!(h.reasons().is_empty());
    assert!(h.sessions.touch_count() >= 40);
}

#[tokio::test(start_paused = true)]
async fn cashier_is_logged_out_after_host_sleep() {
    let h = Harness::new();
    h.login(cashier()).await;
    h.run_for(Duration::from_secs(30)).await;

    h.clock.jump(ChronoDuration::minutes(4));
    h.run_for(Duration::from_secs(5)).await;

    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert_eq!(h.reasons(), vec![LogoutReason::Inactivity]);
    assert_eq!(
        h.notifier.notices()[0].message,
        "You were logged out due to inactivity."
    );
    assert_eq!(h.hub.listener_count(), 0);
    assert_eq!(h.timers_running(), 0);
}

#[tokio::test(start_paused = true)]
async fn admin_survives_host_sleep_within_the_hour() {
    let h = Harness::new();
    h.login(admin()).await;
    h.run_for(Duration::from_secs(30)).await;

    h.clock.jump(ChronoDuration::minutes(20));
    h.run_for(Duration::from_secs(5)).await;

    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert!(h.reasons().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failing_touches_do_not_extend_the_session() {
    let h = Harness::new();
    h.login(cashier()).await;
    h.sessions.fail_touches(true);

    h.run_for(Duration::from_secs(3 * 60)).await;
    assert!(h.store.state(MonitorState::is_monitoring).await);

    h.run_for(Duration::from_secs(10)).await;
    assert_eq!(h.reasons(), vec![LogoutReason::Inactivity]);
}

#[tokio::test(start_paused = true)]
async fn activity_events_record_activity_immediately() {
    let h = Harness::new();
    h.login(cashier()).await;
    let before = h.sessions.touch_count();

    h.clock.jump(ChronoDuration::seconds(90));
    h.hub.notify(ActivityKind::KeyPress);
    h.store.settle().await;

    assert_eq!(h.sessions.touch_count(), before + 1);
    let record = h.sessions.peek().await.unwrap().unwrap();
    assert_eq!(record.last_activity, h.clock.now());
}

// ═══════════════════════════════════════════════════════════════════════
// Storage failures
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn failing_checks_never_log_out() {
    let h = Harness::new();
    h.login(admin()).await;
    h.sessions.fail_checks(true);

    h.run_for(Duration::from_secs(60)).await;

    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert!(h.reasons().is_empty());
    assert!(h.sessions.check_count() >= 12);

    h.sessions.fail_checks(false);
    h.clock.jump(ChronoDuration::minutes(61));
    h.run_for(Duration::from_secs(5)).await;
    assert_eq!(h.reasons(), vec![LogoutReason::Expired]);
}

// ═══════════════════════════════════════════════════════════════════════
// Stopping
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn user_cleared_in_ui_stops_silently() {
    let h = Harness::new();
    h.login(cashier()).await;

    h.send(MonitorAction::UserChanged { user: None }).await;

    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert_eq!(h.timers_running(), 0);
    assert_eq!(h.hub.listener_count(), 0);
    assert!(h.reasons().is_empty());
    assert!(h.sessions.peek().await.unwrap().is_some());

    let touches = h.sessions.touch_count();
    let checks = h.sessions.check_count();
    h.run_for(Duration::from_secs(60)).await;
    assert_eq!(h.sessions.touch_count(), touches);
    assert_eq!(h.sessions.check_count(), checks);

    h.send(MonitorAction::UserChanged { user: None }).await;
    assert_eq!(h.phase().await, MonitorPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn manual_logout_emits_a_single_notice() {
    let h = Harness::new();
    h.login(cashier()).await;

    h.store
        .send(MonitorAction::Logout { reason: LogoutReason::Manual })
        .await
        .unwrap();
    h.send(MonitorAction::Logout { reason: LogoutReason::Manual }).await;

    assert_eq!(h.reasons(), vec![LogoutReason::Manual]);
    assert_eq!(h.notifier.notices()[0].message, "You have been logged out.");
    assert!(h.sessions.peek().await.unwrap().is_none());
    assert_eq!(h.hub.listener_count(), 0);

    let checks = h.sessions.check_count();
    h.run_for(Duration::from_secs(30)).await;
    assert_eq!(h.sessions.check_count(), checks);
    assert_eq!(
        h.store.state(|s| s.last_notice.as_ref().map(|n| n.reason)).await,
        Some(LogoutReason::Manual)
    );
}

#[tokio::test(start_paused = true)]
async fn forced_logout_uses_forced_message() {
    let h = Harness::new();
    h.login(admin()).await;

    h.send(MonitorAction::Logout { reason: LogoutReason::Forced }).await;

    assert_eq!(h.reasons(), vec![LogoutReason::Forced]);
    assert_eq!(h.notifier.notices()[0].message, "Your session was closed.");
}

// ═══════════════════════════════════════════════════════════════════════
// Storage calls overlapping a logout or stop
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn heartbeat_write_in_flight_cannot_restore_a_logged_out_session() {
    let h = Harness::new();
    h.login(admin()).await;

    h.sessions.gate().hold_writes(true);
    tokio::time::advance(Duration::from_secs(15)).await;
    h.until_parked().await;

    h.store
        .send(MonitorAction::Logout { reason: LogoutReason::Manual })
        .await
        .unwrap();
    h.spin().await;
    assert!(h.reasons().is_empty(), "clear must wait for the touch to finish");

    h.sessions.gate().hold_writes(false);
    h.store.settle().await;

    assert_eq!(h.reasons(), vec![LogoutReason::Manual]);
    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert!(h.sessions.peek().await.unwrap().is_none());

    let touches = h.sessions.touch_count();
    h.run_for(Duration::from_secs(60)).await;
    assert!(h.sessions.peek().await.unwrap().is_none());
    assert_eq!(h.sessions.touch_count(), touches);
    assert_eq!(h.reasons(), vec![LogoutReason::Manual]);
}

#[tokio::test(start_paused = true)]
async fn heartbeat_outliving_a_stop_changes_nothing() {
    let h = Harness::new();
    h.login(cashier()).await;

    h.sessions.gate().hold_writes(true);
    tokio::time::advance(Duration::from_secs(15)).await;
    h.until_parked().await;

    h.store.send(MonitorAction::UserChanged { user: None }).await.unwrap();
    h.spin().await;
    assert_eq!(h.timers_running(), 0);

    h.sessions.gate().hold_writes(false);
    h.store.settle().await;

    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert!(!h.listening().await);
    assert!(h.reasons().is_empty());
    assert_eq!(h.hub.listener_count(), 0);

    let touches = h.sessions.touch_count();
    h.run_for(Duration::from_secs(60)).await;
    assert_eq!(h.sessions.touch_count(), touches);
    assert_eq!(h.phase().await, MonitorPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn login_during_logout_survives_the_clear() {
    let h = Harness::new();
    h.login(admin()).await;
    let mut actions = h.store.subscribe_actions();

    h.sessions.gate().hold_removes(true);
    h.store
        .send(MonitorAction::Logout { reason: LogoutReason::Manual })
        .await
        .unwrap();
    h.until_parked().await;

    h.store.send(MonitorAction::LoggedIn { user: cashier() }).await.unwrap();
    h.spin().await;
    assert!(matches!(h.phase().await, MonitorPhase::LoggingOut { .. }));

    h.sessions.gate().hold_removes(false);
    h.store.settle().await;

    assert_eq!(h.reasons(), vec![LogoutReason::Manual]);
    assert_eq!(
        h.store.state(|s| s.current_user().map(|u| u.id.clone())).await,
        Some(cashier().id)
    );
    assert!(h.listening().await);
    assert_eq!(h.sessions.peek().await.unwrap().map(|r| r.user.id), Some(cashier().id));

    let mut order = Vec::new();
    while let Ok(action) = actions.try_recv() {
        match action {
            MonitorAction::LogoutCompleted { .. } => order.push("logout completed"),
            MonitorAction::SessionSaved { .. } => order.push("session saved"),
            _ => {},
        }
    }
    assert_eq!(order, vec!["logout completed", "session saved"]);

    h.run_for(Duration::from_secs(30)).await;
    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert_eq!(h.reasons(), vec![LogoutReason::Manual]);
}

// ═══════════════════════════════════════════════════════════════════════
// Reconciliation with the store
// ═══════════════════════════════════════════════════════════════════════

#[tokio::test(start_paused = true)]
async fn restore_adopts_a_valid_session() {
    let h = Harness::new();
    h.sessions.save(&cashier(), &[school_session::Role::new("caisse")]).await.unwrap();

    h.send(MonitorAction::Restore).await;

    assert_eq!(
        h.store.state(|s| s.current_user().map(|u| u.id.clone())).await,
        Some(cashier().id)
    );
    assert!(h.listening().await);
    assert_eq!(h.hub.listener_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn restore_of_a_lapsed_session_is_silent() {
    let h = Harness::new();
    h.sessions.save(&admin(), &[]).await.unwrap();
    h.clock.jump(ChronoDuration::minutes(61));

    h.send(MonitorAction::Restore).await;

    assert_eq!(h.phase().await, MonitorPhase::Idle);
    assert!(h.reasons().is_empty());
    assert!(h.sessions.peek().await.unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn vanished_record_logs_out_as_expired() {
    let h = Harness::new();
    h.login(admin()).await;

    // Another tab logged out.
    h.sessions.clear().await.unwrap();
    h.run_for(Duration::from_secs(5)).await;

    assert_eq!(h.reasons(), vec![LogoutReason::Expired]);
    assert_eq!(h.phase().await, MonitorPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn session_saved_by_another_tab_is_adopted() {
    let h = Harness::new();
    h.login(admin()).await;
    assert_eq!(h.hub.listener_count(), 0);

    h.sessions
        .save(&cashier(), &[school_session::Role::new("caisse")])
        .await
        .unwrap();
    h.run_for(Duration::from_secs(5)).await;

    assert_eq!(
        h.store.state(|s| s.current_user().map(|u| u.id.clone())).await,
        Some(cashier().id)
    );
    assert!(h.reasons().is_empty());
    assert_eq!(h.hub.listener_count(), 1);
    assert_eq!(h.store.running_tasks(timers::VALIDITY_CHECK), 1);
}

#[tokio::test(start_paused = true)]
async fn user_changed_in_ui_reconciles_with_store() {
    let h = Harness::new();
    h.sessions.save(&admin(), &[]).await.unwrap();

    h.send(MonitorAction::UserChanged { user: Some(admin()) }).await;

    assert!(h.store.state(MonitorState::is_monitoring).await);
    assert_eq!(h.store.running_tasks(timers::ACTIVITY_HEARTBEAT), 1);
}

#[tokio::test(start_paused = true)]
async fn shutdown_stops_all_timers() {
    let h = Harness::new();
    h.login(cashier()).await;

    h.store.shutdown(Duration::from_secs(1)).await.unwrap();
    h.store.settle().await;

    assert_eq!(h.timers_running(), 0);
    assert_eq!(h.hub.listener_count(), 0);
}
