//! Presentation state derivation
//!
//! Pure functions from `(PlaybackState, ViewGate)` to what the overlay shows.
//! Nothing here holds state; the controller re-derives after every mutation.

use crate::config::MediaAsset;
use crate::types::{FailureKind, PlaybackPhase, PlaybackState, ViewGate};
use serde::{Deserialize, Serialize};

/// Audio status badge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioIndicator {
    /// Nothing is playing
    Hidden,
    /// Playing without sound; tapping it enables audio
    Muted,
    /// Playing with sound
    Audible,
}

/// Remaining mandatory-view time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Countdown {
    pub remaining_seconds: u32,
}

impl std::fmt::Display for Countdown {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.remaining_seconds {
            1 => write!(f, "You can skip this ad in 1 second"),
            n => write!(f, "You can skip this ad in {} seconds", n),
        }
    }
}

/// Label on the play affordance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayPrompt {
    /// Playback was blocked by policy
    Play,
    /// The asset failed to load; another attempt is offered
    Retry,
}

/// What the overlay shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presentation {
    pub play_affordance: Option<PlayPrompt>,
    pub audio_indicator: AudioIndicator,
    pub skip_affordance: bool,
    pub countdown: Option<Countdown>,
}

impl Presentation {
    pub fn derive(playback: &PlaybackState, gate: &ViewGate) -> Self {
        let play_affordance = playback.needs_gesture().then(|| {
            match playback.last_failure() {
                Some(FailureKind::Media) => PlayPrompt::Retry,
                _ => PlayPrompt::Play,
            }
        });

        let audio_indicator = match playback.phase() {
            PlaybackPhase::PlayingWithSound => AudioIndicator::Audible,
            PlaybackPhase::PlayingMuted => AudioIndicator::Muted,
            PlaybackPhase::NotStarted | PlaybackPhase::Failed => AudioIndicator::Hidden,
        };

        let countdown = (!gate.is_open()).then(|| Countdown {
            remaining_seconds: gate.remaining_seconds(),
        });

        Self {
            play_affordance,
            audio_indicator,
            skip_affordance: gate.is_open(),
            countdown,
        }
    }

    /// Overlay layers, bottom to top
    pub fn layers(&self, asset: &MediaAsset) -> Vec<Layer> {
        let mut layers = vec![Layer::Video {
            src: asset.src.clone(),
            mime_type: asset.mime_type.clone(),
        }];

        if let Some(prompt) = self.play_affordance {
            layers.push(Layer::PlayButton { prompt });
        }

        if self.audio_indicator != AudioIndicator::Hidden {
            layers.push(Layer::AudioBadge {
                indicator: self.audio_indicator,
            });
        }

        if self.skip_affordance {
            layers.push(Layer::SkipButton);
        }

        if let Some(countdown) = self.countdown {
            layers.push(Layer::Countdown {
                text: countdown.to_string(),
            });
        }

        layers
    }
}

/// Where a layer sits on the full-viewport overlay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    Fill,
    Center,
    TopRight,
    BottomCenter,
    BottomRight,
}

/// One element of the rendered overlay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "layer", rename_all = "snake_case")]
pub enum Layer {
    Video { src: String, mime_type: String },
    PlayButton { prompt: PlayPrompt },
    AudioBadge { indicator: AudioIndicator },
    SkipButton,
    Countdown { text: String },
}

impl Layer {
    pub fn anchor(&self) -> Anchor {
        match self {
            Layer::Video { .. } => Anchor::Fill,
            Layer::PlayButton { .. } => Anchor::Center,
            Layer::AudioBadge { .. } => Anchor::BottomRight,
            Layer::SkipButton => Anchor::TopRight,
            Layer::Countdown { .. } => Anchor::BottomCenter,
        }
    }
}
