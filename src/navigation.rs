use tokio::sync::mpsc;

/// Navigation intents emitted by the session core.
///
/// The core never performs navigation itself; a view layer drains these
/// from the [`NavReceiver`] and routes accordingly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavSignal {
    /// Enter the protected area (successful login).
    Protected,
    /// Return to the public entry view, optionally with a reason shown
    /// to the user.
    Login { message: Option<String> },
}

impl NavSignal {
    pub fn login_with(message: impl Into<String>) -> Self {
        Self::Login {
            message: Some(message.into()),
        }
    }
}

/// Sending half handed to the session core's components.
#[derive(Debug, Clone)]
pub struct NavSender {
    tx: mpsc::UnboundedSender<NavSignal>,
}

impl NavSender {
    /// Dropping the receiver makes this a no-op, so headless embeddings
    /// can ignore navigation entirely.
    pub fn send(&self, signal: NavSignal) {
        let _ = self.tx.send(signal);
    }
}

/// Receiving half for the view layer.
pub type NavReceiver = mpsc::UnboundedReceiver<NavSignal>;

pub fn nav_channel() -> (NavSender, NavReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NavSender { tx }, rx)
}
