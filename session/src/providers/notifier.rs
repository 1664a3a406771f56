//! Logout notification sink.

use crate::state::LogoutNotice;
use tokio::sync::mpsc;

/// Receives the notice shown to the user when a session ends.
///
/// Called exactly once per logout, after the session store was cleared.
/// Implementations must not block: the UI shows a toast and navigates to
/// `redirect_to` on its own schedule.
pub trait LogoutNotifier: Send + Sync {
    /// Deliver a logout notice.
    fn notify(&self, notice: LogoutNotice);
}

/// Notifier that forwards notices over an unbounded channel.
///
/// # Example
///
/// ```
/// use school_session::{ChannelNotifier, LogoutNotice, LogoutNotifier, LogoutReason};
///
/// let (notifier, mut notices) = ChannelNotifier::new();
/// notifier.notify(LogoutNotice::new(LogoutReason::Manual, "/login"));
///
/// let notice = notices.try_recv().ok();
/// assert_eq!(notice.map(|n| n.reason), Some(LogoutReason::Manual));
/// ```
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<LogoutNotice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end the UI reads from.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogoutNotice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl LogoutNotifier for ChannelNotifier {
    fn notify(&self, notice: LogoutNotice) {
        if let Err(error) = self.sender.send(notice) {
            tracing::warn!(
                reason = %error.0.reason,
                "Logout notice dropped: no receiver"
            );
        }
    }
}
