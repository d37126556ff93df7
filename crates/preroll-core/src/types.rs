//! Core types for Preroll

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one ad display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Media engine status as seen by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Nothing is playing yet (initial, or autoplay was rejected)
    NotStarted,
    /// Playing with audio
    PlayingWithSound,
    /// Playing with the media muted
    PlayingMuted,
    /// A gesture-initiated attempt failed; retryable
    Failed,
}

impl PlaybackPhase {
    /// Check if transition to target phase is valid
    pub fn can_transition_to(&self, target: PlaybackPhase) -> bool {
        use PlaybackPhase::*;
        matches!(
            (self, target),
            (NotStarted, PlayingWithSound)
                | (NotStarted, PlayingMuted)
                | (NotStarted, Failed)
                | (Failed, PlayingWithSound)
                | (Failed, PlayingMuted)
                | (PlayingMuted, PlayingWithSound)
        )
    }

    /// True for both playing phases
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackPhase::PlayingWithSound | PlaybackPhase::PlayingMuted)
    }
}

impl std::fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaybackPhase::NotStarted => write!(f, "not_started"),
            PlaybackPhase::PlayingWithSound => write!(f, "playing_with_sound"),
            PlaybackPhase::PlayingMuted => write!(f, "playing_muted"),
            PlaybackPhase::Failed => write!(f, "failed"),
        }
    }
}

/// Why the most recent play attempt was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Autoplay policy refused playback
    Policy,
    /// The asset itself could not be loaded or decoded
    Media,
}

/// Playback status owned by one controller instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackState {
    phase: PlaybackPhase,
    audio_enabled: bool,
    last_failure: Option<FailureKind>,
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            phase: PlaybackPhase::NotStarted,
            audio_enabled: false,
            last_failure: None,
        }
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    pub fn audio_enabled(&self) -> bool {
        self.audio_enabled
    }

    pub fn last_failure(&self) -> Option<FailureKind> {
        self.last_failure
    }

    /// Play affordance is shown exactly when nothing is playing
    pub fn needs_gesture(&self) -> bool {
        !self.phase.is_playing()
    }

    /// Unmuted playback started
    pub fn started_with_sound(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::PlayingWithSound)?;
        self.audio_enabled = true;
        self.last_failure = None;
        Ok(())
    }

    /// Muted fallback playback started
    pub fn started_muted(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::PlayingMuted)?;
        self.audio_enabled = false;
        self.last_failure = None;
        Ok(())
    }

    /// Muted playback was unmuted in place
    pub fn audio_unlocked(&mut self) -> Result<()> {
        self.transition(PlaybackPhase::PlayingWithSound)?;
        self.audio_enabled = true;
        Ok(())
    }

    /// The mount-time autoplay attempt was rejected. The phase stays
    /// `NotStarted` so the viewer is offered the play affordance.
    pub fn autoplay_blocked(&mut self, kind: FailureKind) -> Result<()> {
        if self.phase != PlaybackPhase::NotStarted {
            return Err(self.invalid(PlaybackPhase::NotStarted));
        }
        self.audio_enabled = false;
        self.last_failure = Some(kind);
        Ok(())
    }

    /// Every strategy of a gesture attempt was rejected
    pub fn attempt_failed(&mut self, kind: FailureKind) -> Result<()> {
        if self.phase != PlaybackPhase::Failed {
            self.transition(PlaybackPhase::Failed)?;
        }
        self.audio_enabled = false;
        self.last_failure = Some(kind);
        Ok(())
    }

    fn transition(&mut self, target: PlaybackPhase) -> Result<()> {
        if !self.phase.can_transition_to(target) {
            return Err(self.invalid(target));
        }
        self.phase = target;
        Ok(())
    }

    fn invalid(&self, target: PlaybackPhase) -> Error {
        Error::InvalidStateTransition {
            from: self.phase.to_string(),
            to: target.to_string(),
        }
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of advancing the gate by one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateTick {
    /// Still counting down
    Counting { remaining_seconds: u32 },
    /// This tick opened the gate
    Opened,
    /// The gate was already open; nothing changed
    AlreadyOpen,
}

/// Mandatory-view enforcement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewGate {
    elapsed_seconds: u32,
    total_seconds: u32,
    opened: bool,
}

impl ViewGate {
    pub fn new(total_seconds: u32) -> Self {
        Self {
            elapsed_seconds: 0,
            total_seconds,
            opened: false,
        }
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    pub fn is_open(&self) -> bool {
        self.opened
    }

    /// Seconds left before skip is permitted
    pub fn remaining_seconds(&self) -> u32 {
        self.total_seconds.saturating_sub(self.elapsed_seconds)
    }

    /// Advance by one second. The tick reaching `total_seconds` opens the gate;
    /// once open, the gate never closes and further ticks are ignored.
    pub fn tick(&mut self) -> GateTick {
        if self.opened {
            return GateTick::AlreadyOpen;
        }

        self.elapsed_seconds += 1;
        if self.elapsed_seconds >= self.total_seconds {
            self.opened = true;
            GateTick::Opened
        } else {
            GateTick::Counting {
                remaining_seconds: self.remaining_seconds(),
            }
        }
    }
}
