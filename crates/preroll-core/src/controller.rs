//! Ad Controller - Orchestrates one full-screen ad display
//!
//! Coordinates:
//! - Autoplay and gesture-driven play attempts
//! - The mandatory-view countdown and skip gate
//! - Presentation updates for the host's overlay
//! - The host's close callback

use crate::{
    config::AdConfig,
    events::{AdEvent, AdEventRecord},
    media::MediaElement,
    playback::{AttemptOutcome, PlaybackAttemptManager},
    presentation::{Layer, Presentation},
    state::{lock, Lifecycle, SharedState},
    timer::MandatoryViewTimer,
    types::{PlaybackState, SessionId, ViewGate},
    Error, Result,
};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, watch};
use tracing::{debug, info, instrument, warn};

/// Controller for a single ad display
pub struct AdController {
    /// Unique session ID
    id: SessionId,
    /// Controller configuration
    config: AdConfig,
    /// Playback, gate and lifecycle state
    shared: Arc<SharedState>,
    /// Play attempt state machine
    playback: Arc<PlaybackAttemptManager>,
    /// Exclusively owned media handle
    media: Arc<dyn MediaElement>,
    /// Mandatory-view countdown
    timer: Mutex<MandatoryViewTimer>,
    /// Host callback fired when the viewer skips
    on_close: Box<dyn Fn() + Send + Sync>,
}

impl AdController {
    /// Create a controller. Nothing starts until [`mount`](Self::mount).
    pub fn new<F>(config: AdConfig, media: Arc<dyn MediaElement>, on_close: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        config.validate()?;

        let id = SessionId::new();
        let shared = Arc::new(SharedState::new(id, config.mandatory_view_seconds));
        let playback = Arc::new(PlaybackAttemptManager::new(media.clone(), shared.clone()));

        Ok(Self {
            id,
            config,
            shared,
            playback,
            media,
            timer: Mutex::new(MandatoryViewTimer::new()),
            on_close: Box::new(on_close),
        })
    }

    /// Get session ID
    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &AdConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.lifecycle()
    }

    /// Snapshot of the playback state
    pub fn playback(&self) -> PlaybackState {
        self.shared.playback()
    }

    /// Snapshot of the mandatory-view gate
    pub fn gate(&self) -> ViewGate {
        self.shared.gate()
    }

    /// Presentation derived from the current state
    pub fn presentation(&self) -> Presentation {
        self.shared.presentation()
    }

    /// Overlay layers for the current presentation
    pub fn layers(&self) -> Vec<Layer> {
        self.presentation().layers(&self.config.asset)
    }

    /// Subscribe to presentation changes
    pub fn subscribe_presentation(&self) -> watch::Receiver<Presentation> {
        self.shared.subscribe_presentation()
    }

    /// Subscribe to controller events
    pub fn subscribe_events(&self) -> broadcast::Receiver<AdEventRecord> {
        self.shared.subscribe_events()
    }

    /// Start the countdown and the autoplay attempt.
    /// Must be called from within a tokio runtime.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn mount(&self) -> Result<()> {
        self.shared.mount()?;
        info!(
            src = %self.config.asset.src,
            mandatory_view_seconds = self.config.mandatory_view_seconds,
            "Mounting ad"
        );

        self.shared.emit(AdEvent::Mounted {
            mandatory_view_seconds: self.config.mandatory_view_seconds,
        });
        lock(&self.timer).start(self.shared.clone())?;

        let playback = self.playback.clone();
        tokio::spawn(async move {
            let outcome = playback.attempt_autoplay().await;
            debug!(?outcome, "Autoplay attempt settled");
        });

        Ok(())
    }

    /// Viewer tapped the play affordance
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn handle_user_play(&self) -> Result<AttemptOutcome> {
        self.ensure_mounted()?;
        Ok(self.playback.handle_user_play().await)
    }

    /// Viewer tapped the muted audio indicator. Returns true if audio is on.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn enable_audio(&self) -> Result<bool> {
        self.ensure_mounted()?;
        self.playback.enable_audio()
    }

    /// Viewer tapped the skip affordance. Invokes the close callback only once
    /// the mandatory view has elapsed.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn skip(&self) -> Result<()> {
        self.ensure_mounted()?;

        let gate = self.shared.gate();
        if !gate.is_open() {
            warn!(remaining = gate.remaining_seconds(), "Skip requested before gate opened");
            return Err(Error::GateClosed {
                remaining_seconds: gate.remaining_seconds(),
            });
        }

        info!(elapsed = gate.elapsed_seconds(), "Ad dismissed by viewer");
        self.shared.emit(AdEvent::Closed);
        (self.on_close)();
        Ok(())
    }

    /// Tear down: cancel the countdown, pause the media and drop any
    /// in-flight attempt results. Idempotent.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub fn unmount(&self) {
        if !self.shared.unmount() {
            return;
        }

        let mut timer = lock(&self.timer);
        let countdown_pending = timer.is_running();
        timer.stop();
        drop(timer);

        self.media.pause();
        self.shared.emit(AdEvent::Unmounted);
        info!(countdown_pending, "Ad unmounted");
    }

    fn ensure_mounted(&self) -> Result<()> {
        match self.shared.lifecycle() {
            Lifecycle::Mounted => Ok(()),
            Lifecycle::Created | Lifecycle::Unmounted => Err(Error::NotMounted),
        }
    }
}

impl Drop for AdController {
    fn drop(&mut self) {
        // Never mounted, nothing to tear down
        if self.shared.lifecycle() == Lifecycle::Created {
            return;
        }
        self.unmount();
    }
}
