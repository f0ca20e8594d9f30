//! Event Publisher Adapters
//!
//! `BroadcastEventPublisher` fans events out over a tokio broadcast channel;
//! `RecordingEventPublisher` keeps them in memory for inspection.

use crate::events::CasperEvent;
use crate::ports::outbound::EventPublisher;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing::debug;

/// Broadcast channel publisher.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<CasperEvent>,
}

impl BroadcastEventPublisher {
    /// Create a publisher buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<CasperEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl EventPublisher for BroadcastEventPublisher {
    fn publish(&self, event: CasperEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            // No subscribers yet; events are not retained
            debug!("[casper] No subscribers for {} event", name);
        }
    }
}

/// In-memory publisher for testing.
#[derive(Default)]
pub struct RecordingEventPublisher {
    events: RwLock<Vec<CasperEvent>>,
}

impl RecordingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events published so far, in order.
    pub fn events(&self) -> Vec<CasperEvent> {
        self.events.read().clone()
    }

    /// Drain the recorded events.
    pub fn take(&self) -> Vec<CasperEvent> {
        std::mem::take(&mut *self.events.write())
    }
}

impl EventPublisher for RecordingEventPublisher {
    fn publish(&self, event: CasperEvent) {
        self.events.write().push(event);
    }
}
