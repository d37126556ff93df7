//! Mandatory-view timer
//!
//! A single one-second tick stream drives the [`ViewGate`](crate::ViewGate).
//! The gate opens on the tick that reaches the configured total and the task
//! ends there, so there is no separate one-shot to race against.

use crate::state::SharedState;
use crate::types::GateTick;
use crate::{Error, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

/// Interval between countdown ticks
pub const TICK_PERIOD: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub(crate) struct MandatoryViewTimer {
    handle: Option<JoinHandle<()>>,
}

impl MandatoryViewTimer {
    pub(crate) fn new() -> Self {
        Self { handle: None }
    }

    /// Schedule the tick stream; the first tick lands one period from now.
    /// Must be called from within a tokio runtime.
    pub(crate) fn start(&mut self, shared: Arc<SharedState>) -> Result<()> {
        if self.handle.is_some() {
            return Err(Error::TimerAlreadyStarted);
        }

        let first_tick = Instant::now() + TICK_PERIOD;
        self.handle = Some(tokio::spawn(async move {
            let mut ticker = time::interval_at(first_tick, TICK_PERIOD);
            // Catch up on late wakeups so the gate tracks wall-clock time
            ticker.set_missed_tick_behavior(MissedTickBehavior::Burst);

            loop {
                ticker.tick().await;
                match shared.record_tick() {
                    Some(GateTick::Counting { remaining_seconds }) => {
                        debug!(remaining_seconds, "Mandatory-view tick");
                    }
                    Some(GateTick::Opened) | Some(GateTick::AlreadyOpen) => {
                        info!("Mandatory view complete, skip unlocked");
                        break;
                    }
                    None => break,
                }
            }
        }));

        Ok(())
    }

    /// Cancel any pending ticks. Safe to call repeatedly.
    pub(crate) fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            if !handle.is_finished() {
                debug!("Cancelling mandatory-view timer");
            }
            handle.abort();
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for MandatoryViewTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
