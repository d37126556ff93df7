//! Preroll Core - Full-screen video ad controller
//!
//! This crate provides the logic behind a skippable video ad:
//! - Autoplay with sound, falling back to a muted start and a user gesture
//! - A mandatory-view countdown gating the skip affordance
//! - Presentation derivation for the host's overlay
//! - Event emission for host-side observation
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Preroll Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐                        ┌──────────────┐       │
//! │  │   Playback   │                        │ Mandatory-   │       │
//! │  │   Attempts   │                        │ View Timer   │       │
//! │  └──────┬───────┘                        └──────┬───────┘       │
//! │         │                                       │               │
//! │         └──────────────────┬────────────────────┘               │
//! │                            │                                    │
//! │                     ┌──────┴──────┐                             │
//! │                     │ Shared State│                             │
//! │                     └──────┬──────┘                             │
//! │                            │                                    │
//! │  ┌──────────────┐   ┌──────┴──────┐   ┌──────────────┐          │
//! │  │ Presentation │◀──│     Ad      │──▶│    Event     │          │
//! │  │   (watch)    │   │ Controller  │   │     Bus      │          │
//! │  └──────────────┘   └─────────────┘   └──────────────┘          │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use preroll_core::{AdConfig, AdController, ScriptedMedia};
//! use std::sync::Arc;
//!
//! # async fn run() -> preroll_core::Result<()> {
//! let media = Arc::new(ScriptedMedia::new());
//! let controller = AdController::new(AdConfig::default(), media, || println!("ad closed"))?;
//! controller.mount()?;
//!
//! let mut presentation = controller.subscribe_presentation();
//! presentation.wait_for(|p| p.skip_affordance).await.ok();
//! controller.skip()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod media;
pub mod playback;
pub mod presentation;
pub mod types;

mod state;
mod timer;

pub use config::{AdConfig, MediaAsset, DEFAULT_MANDATORY_VIEW_SECONDS};
pub use controller::AdController;
pub use error::{Error, Result};
pub use events::{AdEvent, AdEventRecord, Strategy};
pub use media::{MediaElement, MediaError, MediaResult, ScriptedMedia};
pub use playback::{AttemptOutcome, AttemptPlan};
pub use presentation::{Anchor, AudioIndicator, Countdown, Layer, PlayPrompt, Presentation};
pub use state::Lifecycle;
pub use timer::TICK_PERIOD;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log library initialization
pub fn init() {
    tracing::info!(version = VERSION, "Preroll Core initialized");
}
