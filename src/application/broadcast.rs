//! Broadcast fan-out to live-view subscribers.
//!
//! Events are fanned out over a `tokio::sync::broadcast` channel; each
//! WebSocket connection owns one receiver. Delivery is best-effort: a
//! subscriber that stops draining (or whose socket write fails) only
//! loses its own events.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Wire-level event discriminator for the push stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    #[serde(rename = "powerwall")]
    Powerwall,
    #[serde(rename = "alert")]
    Alert,
    #[serde(rename = "analytics")]
    Analytics,
    #[serde(rename = "code-update")]
    CodeUpdate,
}

/// One framed push event: `{type, data}`.
#[derive(Debug, Clone, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub data: serde_json::Value,
}

impl Event {
    pub fn new<T: Serialize>(kind: EventKind, data: &T) -> Self {
        Event {
            kind,
            data: serde_json::to_value(data).unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<Event>,
}

impl Broadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Broadcaster { tx }
    }

    /// Send an event to every current subscriber. A send with no
    /// subscribers is a no-op, not an error.
    pub fn publish(&self, event: Event) {
        match self.tx.send(event) {
            Ok(delivered) => debug!("event delivered to {} subscribers", delivered),
            Err(_) => debug!("no live subscribers; event dropped"),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of currently-connected live-view subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
