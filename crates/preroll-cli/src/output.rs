//! Output formatting for CLI

use console::style;
use preroll_core::{AudioIndicator, Layer, PlayPrompt, Presentation};
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            _ => OutputFormat::Text,
        }
    }
}

/// Serialize a value as a single JSON line
pub fn json_line<T: Serialize>(data: &T) -> String {
    serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string())
}

/// One-line summary of what the overlay shows
pub fn describe(presentation: &Presentation) -> String {
    let mut parts = Vec::new();

    match presentation.play_affordance {
        Some(PlayPrompt::Play) => parts.push(style("[▶ Play]").cyan().bold().to_string()),
        Some(PlayPrompt::Retry) => parts.push(style("[↻ Retry]").yellow().bold().to_string()),
        None => {}
    }

    match presentation.audio_indicator {
        AudioIndicator::Audible => parts.push(style("♪ sound on").green().to_string()),
        AudioIndicator::Muted => parts.push(style("✕ muted (tap to unmute)").yellow().to_string()),
        AudioIndicator::Hidden => {}
    }

    if let Some(countdown) = presentation.countdown {
        parts.push(countdown.to_string());
    }

    if presentation.skip_affordance {
        parts.push(style("[✕ Skip]").magenta().bold().to_string());
    }

    parts.join("  ")
}

/// Multi-line dump of the overlay layers
pub fn describe_layers(layers: &[Layer]) -> String {
    layers
        .iter()
        .map(|layer| {
            let label = match layer {
                Layer::Video { src, mime_type } => format!("video {} ({})", src, mime_type),
                Layer::PlayButton { prompt } => format!("play button ({:?})", prompt),
                Layer::AudioBadge { indicator } => format!("audio badge ({:?})", indicator),
                Layer::SkipButton => "skip button".to_string(),
                Layer::Countdown { text } => format!("countdown \"{}\"", text),
            };
            format!("  {:<14} {}", format!("{:?}", layer.anchor()), label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
