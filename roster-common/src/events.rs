//! Event types for roster progress reporting
//!
//! Provides the shared event enum and EventBus. The reconciliation engine emits
//! one event per record plus start/completion events; any number of listeners
//! (progress display, tests) may subscribe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Roster event types
///
/// Serialized with an internal `type` tag so events can be written as JSON lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RosterEvent {
    /// A batch run began
    BatchStarted {
        run_id: Uuid,
        /// Records submitted to the engine
        total_records: usize,
        timestamp: DateTime<Utc>,
    },

    /// One record was reconciled against both stores
    RecordReconciled {
        run_id: Uuid,
        /// 1-based source line of the record
        line_number: usize,
        email: String,
        uid: String,
        /// "created" or "updated"
        action: String,
        /// Whether an image URL was attached to the profile
        image_attached: bool,
        timestamp: DateTime<Utc>,
    },

    /// One record failed; the batch continues
    RecordFailed {
        run_id: Uuid,
        line_number: usize,
        /// None when the record had no usable email
        email: Option<String>,
        /// Failure kind ("validation", "directory", "profile_store")
        kind: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// A batch run finished (possibly early, on cancellation)
    BatchCompleted {
        run_id: Uuid,
        succeeded: usize,
        failed: usize,
        not_attempted: usize,
        cancelled: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },
}

impl RosterEvent {
    pub fn run_id(&self) -> Uuid {
        match self {
            RosterEvent::BatchStarted { run_id, .. }
            | RosterEvent::RecordReconciled { run_id, .. }
            | RosterEvent::RecordFailed { run_id, .. }
            | RosterEvent::BatchCompleted { run_id, .. } => *run_id,
        }
    }
}

/// Broadcast channel for roster events
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RosterEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    ///
    /// # Examples
    ///
    /// ```
    /// use roster_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<RosterEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RosterEvent,
    ) -> Result<usize, broadcast::error::SendError<RosterEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: RosterEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started(total: usize) -> RosterEvent {
        RosterEvent::BatchStarted {
            run_id: Uuid::new_v4(),
            total_records: total,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_is_err() {
        let bus = EventBus::new(10);
        assert!(bus.emit(started(1)).is_err());
        // lossy variant must not panic
        bus.emit_lossy(started(1));
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit_lossy(started(1));
        bus.emit_lossy(started(2));

        match rx.recv().await.unwrap() {
            RosterEvent::BatchStarted { total_records, .. } => assert_eq!(total_records, 1),
            other => panic!("unexpected event: {:?}", other),
        }
        match rx.recv().await.unwrap() {
            RosterEvent::BatchStarted { total_records, .. } => assert_eq!(total_records, 2),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = RosterEvent::RecordFailed {
            run_id: Uuid::nil(),
            line_number: 3,
            email: None,
            kind: "validation".to_string(),
            message: "missing uid".to_string(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "RecordFailed");
        assert_eq!(json["line_number"], 3);
        assert!(json["email"].is_null());
        assert_eq!(event.run_id(), Uuid::nil());
    }
}
