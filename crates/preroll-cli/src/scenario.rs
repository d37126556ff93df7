//! Simulated autoplay policies

use clap::ValueEnum;
use preroll_core::{MediaError, ScriptedMedia};
use std::time::Duration;
use tabled::Tabled;

/// How the simulated platform answers play and unmute requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Unmuted autoplay is permitted
    Allow,
    /// Autoplay blocked; unmuted play works after a tap
    Gesture,
    /// Unmuted play always refused; muted start then unmute works
    MutedFallback,
    /// Muted start works but the first unmute is refused
    MutedOnly,
    /// Every play request is refused by policy
    Blocked,
    /// The asset cannot be loaded
    Unavailable,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::Allow,
        Scenario::Gesture,
        Scenario::MutedFallback,
        Scenario::MutedOnly,
        Scenario::Blocked,
        Scenario::Unavailable,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Scenario::Allow => "allow",
            Scenario::Gesture => "gesture",
            Scenario::MutedFallback => "muted-fallback",
            Scenario::MutedOnly => "muted-only",
            Scenario::Blocked => "blocked",
            Scenario::Unavailable => "unavailable",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Scenario::Allow => "Unmuted autoplay is permitted",
            Scenario::Gesture => "Autoplay blocked; unmuted play works after a tap",
            Scenario::MutedFallback => "Unmuted play refused; muted start then unmute works",
            Scenario::MutedOnly => "Muted start works; first unmute refused",
            Scenario::Blocked => "Every play request refused by policy",
            Scenario::Unavailable => "Asset cannot be loaded",
        }
    }

    /// Build the scripted media element for this scenario
    pub fn media(&self, latency: Duration) -> ScriptedMedia {
        let media = ScriptedMedia::new().with_latency(latency);
        match self {
            Scenario::Allow => media,
            Scenario::Gesture => media.then_play(Err(MediaError::NotAllowed)),
            Scenario::MutedFallback => media
                .then_play(Err(MediaError::NotAllowed))
                .then_play(Err(MediaError::NotAllowed)),
            Scenario::MutedOnly => media
                .then_play(Err(MediaError::NotAllowed))
                .then_play(Err(MediaError::NotAllowed))
                .then_unmute(Err(MediaError::NotAllowed)),
            Scenario::Blocked => media.fallback_play(Err(MediaError::NotAllowed)),
            Scenario::Unavailable => media.fallback_play(Err(MediaError::Source(
                "HTTP 404 fetching asset".to_string(),
            ))),
        }
    }
}

/// Row for the scenario listing
#[derive(Tabled)]
pub struct ScenarioRow {
    #[tabled(rename = "Scenario")]
    pub name: &'static str,
    #[tabled(rename = "Behaviour")]
    pub description: &'static str,
}

impl From<Scenario> for ScenarioRow {
    fn from(scenario: Scenario) -> Self {
        Self {
            name: scenario.name(),
            description: scenario.description(),
        }
    }
}
