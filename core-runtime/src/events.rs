//! # Event Bus System
//!
//! Provides event delivery for the audio sync core using `tokio::sync::broadcast`.
//! Scan and sync passes publish typed events; observers (a push channel, a UI
//! relay) subscribe independently.
//!
//! ## Overview
//!
//! - **Event Types**: Strongly-typed enums for the scan and sync domains
//! - **EventBus**: Central broadcast channel for publishing events
//! - **Subscription Management**: Multiple subscribers can listen independently
//!
//! `EventBus::emit` is synchronous and never blocks, so reconciliation code
//! running on a worker thread can publish directly without awaiting delivery.
//! Slow subscribers observe `RecvError::Lagged` rather than stalling the pass.
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{EventBus, CoreEvent, ScanEvent};
//!
//! let event_bus = EventBus::new(100);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus.emit(CoreEvent::Scan(ScanEvent::Progress { percent: 25 })).ok();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 256;

/// Top-level event type published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum CoreEvent {
    /// Library scan events
    Scan(ScanEvent),
    /// Device sync events
    Sync(SyncEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Scan(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
        }
    }
}

/// Events emitted by a library scan pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanEvent {
    /// Scan pass started
    Started,
    /// Cumulative progress crossed a reporting boundary
    Progress { percent: u8 },
    /// One log line (per added/updated/missing file, plus the summary)
    Log { message: String },
    /// Scan pass finished; counts are reported even when individual
    /// files failed
    Completed {
        added: u64,
        updated: u64,
        missing: u64,
    },
    /// Scan pass aborted
    Failed { error: String },
}

impl ScanEvent {
    pub fn description(&self) -> &str {
        match self {
            ScanEvent::Started => "Scan started",
            ScanEvent::Progress { .. } => "Scan progress",
            ScanEvent::Log { .. } => "Scan log",
            ScanEvent::Completed { .. } => "Scan completed",
            ScanEvent::Failed { .. } => "Scan failed",
        }
    }
}

/// Events emitted by a device sync pass.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum SyncEvent {
    /// Sync pass started
    Started,
    /// One log line (per copied/removed file, playlist, rsync output)
    Log { message: String },
    /// Sync pass finished
    Completed,
    /// Sync pass aborted (connection failure, unknown mode)
    Failed { error: String },
}

impl SyncEvent {
    pub fn description(&self) -> &str {
        match self {
            SyncEvent::Started => "Sync started",
            SyncEvent::Log { .. } => "Sync log",
            SyncEvent::Completed => "Sync completed",
            SyncEvent::Failed { .. } => "Sync failed",
        }
    }
}

/// Central broadcast channel for core events.
///
/// Cloning an `EventBus` is cheap; clones share the same channel, so a pass
/// running on a worker thread can hold its own handle.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of events buffered per subscriber.
    ///   A subscriber that falls further behind receives `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an error
    /// when there are no active subscribers. Never blocks.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber to receive events.
    ///
    /// Each call creates an independent receiver that receives all future
    /// events. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
