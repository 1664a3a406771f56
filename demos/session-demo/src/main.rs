//! Session demo binary
//!
//! Runs the session monitor against a file-backed session slot. Every line
//! typed on stdin counts as user activity; `logout` logs out, `quit` exits.
//!
//! ```text
//! cargo run -p session-demo -- caisse     # inactivity-tracked role
//! cargo run -p session-demo -- admin      # 60 minute lifetime only
//! SESSION_INACTIVITY_MINUTES=1 cargo run -p session-demo
//! ```
//!
//! Restarting the demo within the session lifetime restores the session.

use anyhow::Context;
use school_session::{
    ActivityHub, ActivityKind, ChannelNotifier, FileStorage, LogoutReason, MonitorAction,
    MonitorEnvironment, MonitorState, PersistentSessionStore, SessionConfig, SessionMonitor,
    UserProfile,
};
use school_session_core::SystemClock;
use school_session_runtime::Store;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "session_demo=info,school_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SessionConfig::from_env().context("invalid session configuration")?;
    let role = std::env::args().nth(1).unwrap_or_else(|| "caisse".to_string());
    let data_dir = std::env::var("SESSION_DEMO_DIR")
        .map_or_else(|_| std::env::temp_dir().join("school-session-demo"), Into::into);

    tracing::info!(dir = %data_dir.display(), %role, "Starting session demo");

    let sessions = Arc::new(
        PersistentSessionStore::new(FileStorage::new(&data_dir), SystemClock, config.policy())
            .with_key(config.storage_key.clone()),
    );
    let hub = Arc::new(ActivityHub::new());
    let (notifier, mut notices) = ChannelNotifier::new();
    let env = MonitorEnvironment::new(sessions, Arc::clone(&hub), Arc::new(notifier), config);

    let store = Store::new(MonitorState::default(), SessionMonitor::new(), env);

    // Restore first; log in only if nothing valid was stored.
    let mut restore = store.send(MonitorAction::Restore).await?;
    restore.wait_with_timeout(Duration::from_secs(5)).await?;

    if store.state(MonitorState::is_monitoring).await {
        println!("Restored previous session.");
    } else {
        let user = UserProfile::new("demo", "demo@school.test", [role.as_str()])
            .with_display_name("Demo User");
        store.send(MonitorAction::LoggedIn { user }).await?;
        println!("Logged in as demo@school.test ({role}).");
    }
    println!("Type anything to count as activity, `logout` to log out, `quit` to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line?.as_deref().map(str::trim) {
                    None | Some("quit") => break,
                    Some("logout") => {
                        store.send(MonitorAction::Logout { reason: LogoutReason::Manual }).await?;
                    },
                    Some(_) => {
                        let listeners = hub.notify(ActivityKind::KeyPress);
                        tracing::debug!(listeners, "Activity reported");
                    },
                }
            }
            Some(notice) = notices.recv() => {
                println!("{} Redirecting to {}.", notice.message, notice.redirect_to);
                break;
            }
        }
    }

    store.shutdown(Duration::from_secs(5)).await?;
    Ok(())
}
