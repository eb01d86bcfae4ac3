//! Event bus for debate sessions
//!
//! Provides pub/sub messaging using a Tokio broadcast channel plus an
//! in-memory history so observers that connect late can replay the
//! running debate from the start.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::broadcast;
use tracing::debug;

use super::types::{DebateEvent, EventEnvelope};

/// Default channel capacity for broadcast
pub const CHANNEL_CAPACITY: usize = 256;

/// Shared reference to EventBus
pub type SharedEventBus = Arc<EventBus>;

struct BusState {
    next_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
    history: Vec<EventEnvelope>,
}

/// Ordered event bus with replayable history.
///
/// Publishing never waits on observers: a subscriber that falls more than
/// `capacity` events behind gets `RecvError::Lagged` and can recover the
/// gap from [`EventBus::history`].
///
/// The history holds one debate: publishing `debate_start` clears it and
/// restarts `seq` at 0. Sessions sharing a bus must therefore run one at a
/// time if late subscribers are to see a complete replay.
pub struct EventBus {
    sender: broadcast::Sender<EventEnvelope>,
    state: Mutex<BusState>,
}

impl EventBus {
    /// Create a bus with the default capacity
    pub fn new() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }

    /// Create a bus with a custom broadcast capacity (minimum 1)
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            state: Mutex::new(BusState {
                next_seq: 0,
                last_timestamp: None,
                history: Vec::new(),
            }),
        }
    }

    /// Create a shared reference to this event bus
    pub fn shared(self) -> SharedEventBus {
        Arc::new(self)
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        // A panicking publisher never leaves a half-written entry behind.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stamp, record, and broadcast an event.
    ///
    /// Sequence numbers and timestamps are assigned under the history lock,
    /// so the broadcast order, the history order, and `seq` always agree.
    pub fn publish(&self, session_id: &str, event: DebateEvent) -> EventEnvelope {
        let event_type = event.event_type();
        let mut state = self.lock();

        if matches!(event, DebateEvent::DebateStart { .. }) {
            state.history.clear();
            state.next_seq = 0;
        }

        let now = Utc::now();
        let timestamp = match state.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        let envelope = EventEnvelope {
            seq: state.next_seq,
            session_id: session_id.to_string(),
            timestamp,
            event,
        };
        state.next_seq += 1;
        state.last_timestamp = Some(timestamp);
        state.history.push(envelope.clone());

        // Broadcast to subscribers (ignore if no receivers)
        match self.sender.send(envelope.clone()) {
            Ok(count) => debug!(
                event_type,
                seq = envelope.seq,
                receivers = count,
                "Event published"
            ),
            Err(_) => debug!(event_type, seq = envelope.seq, "Event published (no receivers)"),
        }
        envelope
    }

    /// Subscribe to live events only
    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.sender.subscribe()
    }

    /// Snapshot of the history plus a receiver for everything after it.
    ///
    /// Taken under the publish lock: no event is both in the snapshot and
    /// delivered live, and none is missed.
    pub fn subscribe_with_history(
        &self,
    ) -> (Vec<EventEnvelope>, broadcast::Receiver<EventEnvelope>) {
        let state = self.lock();
        let receiver = self.sender.subscribe();
        (state.history.clone(), receiver)
    }

    /// Snapshot of the current debate's events
    pub fn history(&self) -> Vec<EventEnvelope> {
        self.lock().history.clone()
    }

    /// History of a single session
    pub fn session_history(&self, session_id: &str) -> Vec<EventEnvelope> {
        self.lock()
            .history
            .iter()
            .filter(|e| e.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Get the number of current subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Publishes events on behalf of one session
#[derive(Clone)]
pub struct SessionEmitter {
    bus: SharedEventBus,
    session_id: String,
}

impl SessionEmitter {
    pub fn new(bus: SharedEventBus, session_id: &str) -> Self {
        Self {
            bus,
            session_id: session_id.to_string(),
        }
    }

    pub fn emit(&self, event: DebateEvent) -> EventEnvelope {
        self.bus.publish(&self.session_id, event)
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}
