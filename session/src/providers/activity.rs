//! User activity sources.
//!
//! In the browser, "activity" is a set of raw DOM events listened to in the
//! capture phase, so a handler deeper in the tree that stops propagation does
//! not hide it. Other hosts have their own notion of activity; they plug in
//! through [`ActivitySource`].

use futures::Stream;
use std::pin::Pin;
use tokio::sync::broadcast;

/// Kind of user interaction that counts as activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActivityKind {
    /// Pointer or mouse button pressed.
    PointerDown,
    /// Pointer moved.
    PointerMove,
    /// Key pressed.
    KeyPress,
    /// Page or element scrolled.
    Scroll,
    /// Touch started.
    Touch,
    /// Click.
    Click,
}

/// Stream of activity events. Dropping it detaches the listener.
pub type ActivityStream = Pin<Box<dyn Stream<Item = ActivityKind> + Send>>;

/// Capability to observe user activity.
pub trait ActivitySource: Send + Sync {
    /// Attach a listener.
    ///
    /// Every call attaches a new, independent listener; the caller guards
    /// against attaching twice.
    fn subscribe(&self) -> ActivityStream;
}

/// Activity source fed by the host.
///
/// The host calls [`ActivityHub::notify`] from its event handlers; every
/// attached listener receives the event. Bursts beyond the buffer are
/// dropped for lagging listeners, which loses nothing that matters: any one
/// event is enough to refresh the session.
///
/// # Example
///
/// ```
/// use school_session::{ActivityHub, ActivityKind, ActivitySource};
///
/// let hub = ActivityHub::new();
/// let listener = hub.subscribe();
/// assert_eq!(hub.listener_count(), 1);
/// drop(listener);
/// assert_eq!(hub.listener_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct ActivityHub {
    sender: broadcast::Sender<ActivityKind>,
}

impl ActivityHub {
    /// Default event buffer per listener.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Create a hub with the default buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a hub buffering up to `capacity` events per listener.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Report an interaction.
    ///
    /// # Returns
    ///
    /// The number of listeners that will see the event.
    pub fn notify(&self, kind: ActivityKind) -> usize {
        self.sender.send(kind).unwrap_or(0)
    }

    /// Number of attached listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ActivityHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ActivitySource for ActivityHub {
    fn subscribe(&self) -> ActivityStream {
        let mut receiver = self.sender.subscribe();

        Box::pin(async_stream::stream! {
            loop {
                match receiver.recv().await {
                    Ok(kind) => yield kind,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::trace!(skipped, "Activity listener lagged");
                    },
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }
}
