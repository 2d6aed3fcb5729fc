use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 16;

/// Signals the HTTP layer raises outside the request/response flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    /// The server rejected our credential. Persisted session is already gone.
    Unauthorized,
}

/// Fan-out of [`AuthEvent`]s to whoever subscribed (navigation, UI).
#[derive(Debug, Clone)]
pub struct AuthEvents {
    sender: broadcast::Sender<AuthEvent>,
}

impl AuthEvents {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: AuthEvent) {
        // No subscribers is fine: nobody is navigating.
        let delivered = self.sender.send(event).unwrap_or(0);
        tracing::debug!("Auth event {:?} delivered to {} subscriber(s)", event, delivered);
    }
}

impl Default for AuthEvents {
    fn default() -> Self {
        Self::new()
    }
}
