//! Host-observable controller events
//!
//! Every state mutation is published on a broadcast channel so hosts can
//! log or react to it. Nothing is buffered for later delivery: events sent
//! while nobody subscribes are dropped.

use crate::types::{FailureKind, PlaybackPhase, SessionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

/// Capacity of the event channel; slow subscribers lag past this
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Playback strategy that was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Play with audio
    Unmuted,
    /// Play muted, then unmute in place
    MutedThenUnmute,
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Strategy::Unmuted => write!(f, "unmuted"),
            Strategy::MutedThenUnmute => write!(f, "muted_then_unmute"),
        }
    }
}

/// Controller event types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AdEvent {
    /// Controller mounted, timer and autoplay started
    Mounted { mandatory_view_seconds: u32 },

    /// Playback phase changed
    PlaybackChanged {
        from: PlaybackPhase,
        to: PlaybackPhase,
        audio_enabled: bool,
    },

    /// A play or unmute request was refused by the platform
    PlayRejected {
        strategy: Strategy,
        kind: FailureKind,
        reason: String,
    },

    /// One second of mandatory view elapsed
    Tick { elapsed: u32, remaining: u32 },

    /// Skip is now permitted
    GateOpened { elapsed: u32 },

    /// Viewer dismissed the ad
    Closed,

    /// Controller torn down
    Unmounted,
}

/// Event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdEventRecord {
    /// Session ID
    pub session_id: SessionId,
    /// Sequence number, starting at 0 per session
    pub sequence: u64,
    /// Timestamp
    pub timestamp: DateTime<Utc>,
    /// The event
    #[serde(flatten)]
    pub event: AdEvent,
}

/// Sequencing broadcaster for [`AdEvent`]s
#[derive(Debug)]
pub struct EventBus {
    session_id: SessionId,
    sequence: AtomicU64,
    tx: broadcast::Sender<AdEventRecord>,
}

impl EventBus {
    pub fn new(session_id: SessionId) -> Self {
        let (tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            session_id,
            sequence: AtomicU64::new(0),
            tx,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdEventRecord> {
        self.tx.subscribe()
    }

    pub fn emit(&self, event: AdEvent) {
        let record = AdEventRecord {
            session_id: self.session_id,
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
            timestamp: Utc::now(),
            event,
        };
        // No subscribers is not an error
        let _ = self.tx.send(record);
    }
}
