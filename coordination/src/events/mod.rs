//! Event stream for debate sessions
//!
//! # Architecture
//!
//! 1. **Event Types** (`types.rs`): the ten observer-facing event kinds,
//!    wrapped in an [`EventEnvelope`] carrying `seq`, `session_id` and a
//!    strictly increasing `timestamp`.
//!
//! 2. **Event Bus** (`bus.rs`): Tokio broadcast-based pub/sub with an
//!    in-memory history of the running debate for late-subscriber replay.
//!
//! # Event Flow
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ Coordinator  │────▶│  Event Bus   │────▶│  Observers   │
//! │   (emit)     │     │  (broadcast) │     │   (recv)     │
//! └──────────────┘     └──────┬───────┘     └──────────────┘
//!                             │
//!                             ▼
//!                      ┌──────────────┐
//!                      │   History    │
//!                      │  (replay)    │
//!                      └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let bus = EventBus::new().shared();
//! let (replay, mut live) = bus.subscribe_with_history();
//! for event in replay {
//!     render(&event);
//! }
//! while let Ok(event) = live.recv().await {
//!     render(&event);
//! }
//! ```

pub mod bus;
pub mod types;

pub use bus::{EventBus, SessionEmitter, SharedEventBus, CHANNEL_CAPACITY};
pub use types::{DebateEvent, EventEnvelope};
