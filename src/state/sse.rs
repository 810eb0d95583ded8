use tokio::sync::broadcast;

use crate::dto::sse::ServerEvent;

/// Fan-out point for one SSE stream (a session or the leaderboard).
///
/// Subscribers that fall more than the channel capacity behind lose the
/// oldest events.
pub struct SseHub {
    sender: broadcast::Sender<ServerEvent>,
}

impl SseHub {
    /// Hub buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receive every event sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Send to the current subscribers and return how many there were.
    pub fn broadcast(&self, event: ServerEvent) -> usize {
        self.sender.send(event).unwrap_or(0)
    }
}
