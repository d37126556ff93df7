//! Playback attempt manager
//!
//! Gets the ad audibly playing with as little friction as the platform's
//! autoplay policy allows. Attempts follow a linear plan:
//!
//! ```text
//! Autoplay (mount):  Unmuted ──rejected──▶ NotStarted (muted, play affordance)
//! Gesture:           Unmuted ──rejected──▶ MutedThenUnmute ──rejected──▶ Failed (retryable)
//! ```
//!
//! One attempt runs at a time. A gesture that lands while the mount-time
//! attempt is pending is queued behind it; a second gesture is ignored.
//! Every completion is checked against the instance lifecycle; results that
//! arrive after unmount are dropped.

use crate::events::{AdEvent, Strategy};
use crate::media::{MediaElement, MediaError};
use crate::state::SharedState;
use crate::types::{FailureKind, PlaybackPhase, PlaybackState};
use crate::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Ordered strategies tried by one attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptPlan {
    /// Mount-time attempt; never falls back on its own
    Autoplay,
    /// Attempt triggered by an explicit viewer gesture
    Gesture,
}

impl AttemptPlan {
    pub fn strategies(&self) -> &'static [Strategy] {
        match self {
            AttemptPlan::Autoplay => &[Strategy::Unmuted],
            AttemptPlan::Gesture => &[Strategy::Unmuted, Strategy::MutedThenUnmute],
        }
    }
}

/// Result of an attempt as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// Media is playing
    Playing { audio_enabled: bool },
    /// Every strategy was rejected; the play affordance is shown
    NeedsGesture,
    /// Media was already playing; nothing was attempted
    AlreadyPlaying,
    /// A competing attempt was already pending; this one was ignored
    Busy,
    /// The instance was unmounted before the attempt settled
    Abandoned,
}

enum StrategyResult {
    Started,
    Rejected(FailureKind),
    Abandoned,
}

/// Clears the pending-gesture flag when a gesture ends or its future is dropped
struct GesturePending<'a>(&'a AtomicBool);

impl Drop for GesturePending<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub(crate) struct PlaybackAttemptManager {
    media: Arc<dyn MediaElement>,
    shared: Arc<SharedState>,
    /// Held for the whole of one attempt
    attempt: Mutex<()>,
    gesture_pending: AtomicBool,
}

impl PlaybackAttemptManager {
    pub(crate) fn new(media: Arc<dyn MediaElement>, shared: Arc<SharedState>) -> Self {
        Self {
            media,
            shared,
            attempt: Mutex::new(()),
            gesture_pending: AtomicBool::new(false),
        }
    }

    pub(crate) async fn attempt_autoplay(&self) -> AttemptOutcome {
        let Ok(_attempt) = self.attempt.try_lock() else {
            debug!("Autoplay skipped, play attempt already in flight");
            return AttemptOutcome::Busy;
        };
        self.run(AttemptPlan::Autoplay).await
    }

    pub(crate) async fn handle_user_play(&self) -> AttemptOutcome {
        if self.gesture_pending.swap(true, Ordering::SeqCst) {
            debug!("Play gesture ignored, another gesture is pending");
            return AttemptOutcome::Busy;
        }
        let _pending = GesturePending(&self.gesture_pending);

        // Waits out a pending autoplay attempt
        let _attempt = self.attempt.lock().await;
        if self.shared.playback().phase().is_playing() {
            debug!("Play gesture ignored, media already playing");
            return AttemptOutcome::AlreadyPlaying;
        }
        self.run(AttemptPlan::Gesture).await
    }

    /// Unmute muted playback in place. Returns true if audio is now on.
    pub(crate) fn enable_audio(&self) -> Result<bool> {
        match self.shared.playback().phase() {
            PlaybackPhase::PlayingWithSound => Ok(true),
            PlaybackPhase::PlayingMuted => self.unmute_in_place(),
            phase => {
                debug!(%phase, "Audio gesture ignored, nothing playing");
                Ok(false)
            }
        }
    }

    /// Run one plan. Callers hold the attempt lock.
    async fn run(&self, plan: AttemptPlan) -> AttemptOutcome {
        let mut last_failure = FailureKind::Policy;
        for &strategy in plan.strategies() {
            match self.try_strategy(strategy).await {
                StrategyResult::Started => {
                    let playback = self.shared.playback();
                    info!(?plan, %strategy, phase = %playback.phase(), "Playback started");
                    return AttemptOutcome::Playing {
                        audio_enabled: playback.audio_enabled(),
                    };
                }
                StrategyResult::Rejected(kind) => last_failure = kind,
                StrategyResult::Abandoned => return AttemptOutcome::Abandoned,
            }
        }

        let applied = match plan {
            AttemptPlan::Autoplay => {
                // Leave the element muted so a later gesture can fall back cleanly
                let _ = self.media.set_muted(true);
                self.apply(|p| p.autoplay_blocked(last_failure))
            }
            AttemptPlan::Gesture => self.apply(|p| p.attempt_failed(last_failure)),
        };

        if applied {
            info!(?plan, kind = ?last_failure, "All play strategies rejected, awaiting gesture");
            AttemptOutcome::NeedsGesture
        } else {
            AttemptOutcome::Abandoned
        }
    }

    async fn try_strategy(&self, strategy: Strategy) -> StrategyResult {
        if !self.shared.is_mounted() {
            return StrategyResult::Abandoned;
        }

        let muted = strategy == Strategy::MutedThenUnmute;
        if let Err(err) = self.media.set_muted(muted) {
            return self.rejected(strategy, &err);
        }

        debug!(%strategy, "Requesting playback");
        if let Err(err) = self.media.play().await {
            if !self.shared.is_mounted() {
                return StrategyResult::Abandoned;
            }
            return self.rejected(strategy, &err);
        }

        let started = match strategy {
            Strategy::Unmuted => self.apply(PlaybackState::started_with_sound),
            Strategy::MutedThenUnmute => self.apply(PlaybackState::started_muted),
        };
        if !started {
            // Settled after teardown; the element must not keep playing
            self.media.pause();
            return StrategyResult::Abandoned;
        }

        if strategy == Strategy::MutedThenUnmute {
            // A refused unmute leaves muted playback running
            let _ = self.unmute_in_place();
        }
        StrategyResult::Started
    }

    fn unmute_in_place(&self) -> Result<bool> {
        match self.media.set_muted(false) {
            Ok(()) => {
                let applied = self.apply(PlaybackState::audio_unlocked);
                Ok(applied)
            }
            Err(err) => {
                let _ = self.media.set_muted(true);
                warn!(error = %err, "In-place unmute refused, continuing muted");
                if self.shared.is_mounted() {
                    self.shared.emit(AdEvent::PlayRejected {
                        strategy: Strategy::MutedThenUnmute,
                        kind: err.kind(),
                        reason: err.to_string(),
                    });
                }
                Ok(false)
            }
        }
    }

    fn rejected(&self, strategy: Strategy, err: &MediaError) -> StrategyResult {
        let kind = err.kind();
        match kind {
            FailureKind::Policy => info!(%strategy, error = %err, "Play request refused by policy"),
            FailureKind::Media => warn!(%strategy, error = %err, "Play request failed"),
        }
        self.shared.emit(AdEvent::PlayRejected {
            strategy,
            kind,
            reason: err.to_string(),
        });
        StrategyResult::Rejected(kind)
    }

    /// Apply a transition; false if it was dropped
    fn apply<F>(&self, transition: F) -> bool
    where
        F: FnOnce(&mut PlaybackState) -> Result<()>,
    {
        match self.shared.update_playback(transition) {
            Ok(applied) => applied,
            Err(err) => {
                warn!(error = %err, "Rejected playback transition");
                false
            }
        }
    }
}
