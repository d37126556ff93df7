//! Instance state shared by the controller, the attempt manager and the timer
//!
//! All mutation goes through short critical sections that never span an
//! `.await`. Each mutation re-derives the presentation and is discarded
//! once the instance has been unmounted. Events describing a mutation are
//! emitted inside the same critical section, so sequence numbers follow
//! mutation order.

use crate::events::{AdEvent, AdEventRecord, EventBus};
use crate::presentation::Presentation;
use crate::types::{GateTick, PlaybackState, SessionId, ViewGate};
use crate::{Error, Result};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mount lifecycle of one controller instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Mounted,
    Unmounted,
}

#[derive(Debug)]
struct AdState {
    lifecycle: Lifecycle,
    playback: PlaybackState,
    gate: ViewGate,
}

#[derive(Debug)]
pub(crate) struct SharedState {
    state: Mutex<AdState>,
    presentation_tx: watch::Sender<Presentation>,
    events: EventBus,
}

impl SharedState {
    pub(crate) fn new(session_id: SessionId, mandatory_view_seconds: u32) -> Self {
        let playback = PlaybackState::new();
        let gate = ViewGate::new(mandatory_view_seconds);
        let (presentation_tx, _) = watch::channel(Presentation::derive(&playback, &gate));

        Self {
            state: Mutex::new(AdState {
                lifecycle: Lifecycle::Created,
                playback,
                gate,
            }),
            presentation_tx,
            events: EventBus::new(session_id),
        }
    }

    pub(crate) fn lifecycle(&self) -> Lifecycle {
        lock(&self.state).lifecycle
    }

    pub(crate) fn is_mounted(&self) -> bool {
        self.lifecycle() == Lifecycle::Mounted
    }

    pub(crate) fn playback(&self) -> PlaybackState {
        lock(&self.state).playback.clone()
    }

    pub(crate) fn gate(&self) -> ViewGate {
        lock(&self.state).gate
    }

    pub(crate) fn presentation(&self) -> Presentation {
        let state = lock(&self.state);
        Presentation::derive(&state.playback, &state.gate)
    }

    pub(crate) fn subscribe_presentation(&self) -> watch::Receiver<Presentation> {
        self.presentation_tx.subscribe()
    }

    pub(crate) fn subscribe_events(&self) -> broadcast::Receiver<AdEventRecord> {
        self.events.subscribe()
    }

    pub(crate) fn emit(&self, event: AdEvent) {
        self.events.emit(event);
    }

    pub(crate) fn mount(&self) -> Result<()> {
        let mut state = lock(&self.state);
        if state.lifecycle != Lifecycle::Created {
            return Err(Error::AlreadyMounted);
        }
        state.lifecycle = Lifecycle::Mounted;
        Ok(())
    }

    /// Returns false if the instance was already unmounted
    pub(crate) fn unmount(&self) -> bool {
        let mut state = lock(&self.state);
        let was_unmounted = state.lifecycle == Lifecycle::Unmounted;
        state.lifecycle = Lifecycle::Unmounted;
        !was_unmounted
    }

    /// Apply a named playback transition.
    ///
    /// Returns `Ok(false)` when the instance is no longer mounted; the
    /// transition is dropped in that case.
    pub(crate) fn update_playback<F>(&self, transition: F) -> Result<bool>
    where
        F: FnOnce(&mut PlaybackState) -> Result<()>,
    {
        let mut state = lock(&self.state);
        if state.lifecycle != Lifecycle::Mounted {
            debug!(lifecycle = ?state.lifecycle, "Discarding playback update");
            return Ok(false);
        }

        let from = state.playback.phase();
        transition(&mut state.playback)?;
        let to = state.playback.phase();
        let audio_enabled = state.playback.audio_enabled();
        self.presentation_tx
            .send_replace(Presentation::derive(&state.playback, &state.gate));

        if from != to {
            self.emit(AdEvent::PlaybackChanged {
                from,
                to,
                audio_enabled,
            });
        }
        drop(state);
        Ok(true)
    }

    /// Advance the gate by one tick. `None` once unmounted.
    pub(crate) fn record_tick(&self) -> Option<GateTick> {
        let mut state = lock(&self.state);
        if state.lifecycle != Lifecycle::Mounted {
            debug!(lifecycle = ?state.lifecycle, "Discarding timer tick");
            return None;
        }

        let tick = state.gate.tick();
        let elapsed = state.gate.elapsed_seconds();
        self.presentation_tx
            .send_replace(Presentation::derive(&state.playback, &state.gate));

        match tick {
            GateTick::Counting { remaining_seconds } => self.emit(AdEvent::Tick {
                elapsed,
                remaining: remaining_seconds,
            }),
            GateTick::Opened => {
                self.emit(AdEvent::Tick { elapsed, remaining: 0 });
                self.emit(AdEvent::GateOpened { elapsed });
            }
            GateTick::AlreadyOpen => {}
        }
        drop(state);
        Some(tick)
    }
}
