//! Media element seam
//!
//! The controller never talks to a platform player directly. Hosts adapt
//! their video element to [`MediaElement`]; [`ScriptedMedia`] is a
//! deterministic implementation used by tests and the CLI simulator.

use crate::state::lock;
use crate::types::FailureKind;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Result type for media element calls
pub type MediaResult<T> = std::result::Result<T, MediaError>;

/// Platform play/unmute rejections
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Autoplay policy refused the request
    #[error("Playback not allowed by autoplay policy")]
    NotAllowed,

    /// Source could not be fetched or is unsupported
    #[error("Media source unavailable: {0}")]
    Source(String),

    /// Source was fetched but could not be decoded
    #[error("Media decode failed: {0}")]
    Decode(String),

    /// The request was interrupted, e.g. by a pause
    #[error("Playback request aborted")]
    Aborted,
}

impl MediaError {
    /// Collapse platform errors into the two kinds the controller tracks
    pub fn kind(&self) -> FailureKind {
        match self {
            MediaError::NotAllowed | MediaError::Aborted => FailureKind::Policy,
            MediaError::Source(_) | MediaError::Decode(_) => FailureKind::Media,
        }
    }
}

/// A single platform media playback handle
#[async_trait]
pub trait MediaElement: Send + Sync {
    /// Request playback; resolves once the platform accepts or rejects it
    async fn play(&self) -> MediaResult<()>;

    /// Change the mute flag. Unmuting active playback may be refused.
    fn set_muted(&self, muted: bool) -> MediaResult<()>;

    fn is_muted(&self) -> bool;

    fn pause(&self);
}

/// Media element whose outcomes are scripted per call.
///
/// Each `play()` pops the next play outcome, falling back to
/// `fallback_play` once the script is exhausted; unmuting while playing
/// does the same with the unmute script.
#[derive(Debug)]
pub struct ScriptedMedia {
    play_script: Mutex<VecDeque<MediaResult<()>>>,
    unmute_script: Mutex<VecDeque<MediaResult<()>>>,
    fallback_play: MediaResult<()>,
    fallback_unmute: MediaResult<()>,
    latency: Duration,
    muted: AtomicBool,
    playing: AtomicBool,
    play_calls: Mutex<Vec<bool>>,
}

impl ScriptedMedia {
    /// Media that accepts every request
    pub fn new() -> Self {
        Self {
            play_script: Mutex::new(VecDeque::new()),
            unmute_script: Mutex::new(VecDeque::new()),
            fallback_play: Ok(()),
            fallback_unmute: Ok(()),
            latency: Duration::ZERO,
            muted: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            play_calls: Mutex::new(Vec::new()),
        }
    }

    /// Queue the outcome of the next unscripted `play()` call
    pub fn then_play(self, outcome: MediaResult<()>) -> Self {
        lock(&self.play_script).push_back(outcome);
        self
    }

    /// Queue the outcome of the next in-place unmute
    pub fn then_unmute(self, outcome: MediaResult<()>) -> Self {
        lock(&self.unmute_script).push_back(outcome);
        self
    }

    /// Outcome of `play()` once the script is exhausted
    pub fn fallback_play(mut self, outcome: MediaResult<()>) -> Self {
        self.fallback_play = outcome;
        self
    }

    /// Outcome of in-place unmutes once the script is exhausted
    pub fn fallback_unmute(mut self, outcome: MediaResult<()>) -> Self {
        self.fallback_unmute = outcome;
        self
    }

    /// Delay before each `play()` settles
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    /// Mute flag at the time of each `play()` call, in call order
    pub fn play_calls(&self) -> Vec<bool> {
        lock(&self.play_calls).clone()
    }
}

impl Default for ScriptedMedia {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaElement for ScriptedMedia {
    async fn play(&self) -> MediaResult<()> {
        lock(&self.play_calls).push(self.is_muted());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let outcome = lock(&self.play_script)
            .pop_front()
            .unwrap_or_else(|| self.fallback_play.clone());

        debug!(muted = self.is_muted(), ok = outcome.is_ok(), "Scripted play settled");
        if outcome.is_ok() {
            self.playing.store(true, Ordering::SeqCst);
        }
        outcome
    }

    fn set_muted(&self, muted: bool) -> MediaResult<()> {
        if !muted && self.is_muted() && self.is_playing() {
            lock(&self.unmute_script)
                .pop_front()
                .unwrap_or_else(|| self.fallback_unmute.clone())?;
        }
        self.muted.store(muted, Ordering::SeqCst);
        Ok(())
    }

    fn is_muted(&self) -> bool {
        self.muted.load(Ordering::SeqCst)
    }

    fn pause(&self) {
        self.playing.store(false, Ordering::SeqCst);
    }
}
