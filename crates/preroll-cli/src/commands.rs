//! CLI command implementations

use crate::output::{describe, describe_layers, json_line, OutputFormat};
use crate::scenario::{Scenario, ScenarioRow};
use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use preroll_core::{AdConfig, AdController, AdEventRecord, AudioIndicator};
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tabled::{settings::Style, Table};
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Options for the `play` command
#[derive(Debug, Clone)]
pub struct PlayOptions {
    pub scenario: Scenario,
    pub config: Option<PathBuf>,
    pub tap_at: Vec<u64>,
    pub auto_skip: bool,
    pub latency_ms: u64,
    pub show_layers: bool,
}

/// Load the configuration file, or defaults when none is given
fn load_config(path: Option<&Path>) -> anyhow::Result<AdConfig> {
    match path {
        Some(path) => AdConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(AdConfig::default()),
    }
}

/// Tap whichever affordance the overlay currently offers
async fn tap(controller: &AdController) -> anyhow::Result<()> {
    let presentation = controller.presentation();

    if presentation.play_affordance.is_some() {
        let outcome = controller.handle_user_play().await?;
        debug!(?outcome, "Play tap handled");
    } else if presentation.audio_indicator == AudioIndicator::Muted {
        let audible = controller.enable_audio()?;
        debug!(audible, "Audio tap handled");
    } else if presentation.skip_affordance {
        controller.skip()?;
    } else {
        info!("Tap ignored, nothing to interact with yet");
    }
    Ok(())
}

/// Forward stdin lines from a dedicated thread so a pending read never
/// holds up runtime shutdown
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Records still queued on the event stream
fn pending_events(events: &mut broadcast::Receiver<AdEventRecord>) -> Vec<AdEventRecord> {
    let mut pending = Vec::new();
    loop {
        match events.try_recv() {
            Ok(record) => pending.push(record),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Event stream lagged");
            }
            Err(_) => break,
        }
    }
    pending
}

fn countdown_bar(total: u32) -> anyhow::Result<ProgressBar> {
    let bar = ProgressBar::new(u64::from(total));
    bar.set_style(
        ProgressStyle::with_template("{bar:30.magenta/white} {pos:>2}/{len}s  {msg}")?
            .progress_chars("█▉ "),
    );
    Ok(bar)
}

/// Play one simulated ad
pub async fn play(opts: PlayOptions, format: OutputFormat) -> anyhow::Result<()> {
    let config = load_config(opts.config.as_deref())?;
    let media = Arc::new(opts.scenario.media(Duration::from_millis(opts.latency_ms)));

    let closed = Arc::new(Notify::new());
    let on_close = {
        let closed = closed.clone();
        move || closed.notify_one()
    };
    let controller = Arc::new(AdController::new(config.clone(), media, on_close)?);
    let mut presentation = controller.subscribe_presentation();
    let mut events = controller.subscribe_events();

    let bar = match format {
        OutputFormat::Text => {
            println!(
                "Playing {} ({}) under scenario '{}', skip unlocks after {}s",
                config.asset.src,
                config.asset.mime_type,
                opts.scenario.name(),
                config.mandatory_view_seconds
            );
            println!("Press Enter to tap the current affordance, Ctrl-C to abort.\n");
            Some(countdown_bar(config.mandatory_view_seconds)?)
        }
        OutputFormat::Json => None,
    };

    controller.mount()?;
    let started = Instant::now();

    let mut taps = opts.tap_at.clone();
    taps.sort_unstable();
    let tapper = {
        let controller = controller.clone();
        tokio::spawn(async move {
            for secs in taps {
                tokio::time::sleep_until(started + Duration::from_secs(secs)).await;
                info!(at_secs = secs, "Scripted tap");
                if let Err(err) = tap(&controller).await {
                    warn!(error = %err, "Scripted tap failed");
                }
            }
        })
    };

    let mut stdin = spawn_stdin_reader();
    let mut stdin_open = true;
    let mut was_closed = false;

    if let Some(bar) = &bar {
        bar.set_message(describe(&controller.presentation()));
    }

    loop {
        tokio::select! {
            changed = presentation.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = presentation.borrow_and_update().clone();
                match &bar {
                    Some(bar) => {
                        bar.set_position(u64::from(controller.gate().elapsed_seconds()));
                        bar.set_message(describe(&current));
                    }
                    None => println!("{}", json_line(&current)),
                }
                if opts.auto_skip && current.skip_affordance {
                    controller.skip()?;
                }
            }
            Ok(record) = events.recv(), if format == OutputFormat::Json => {
                println!("{}", json_line(&record));
            }
            line = stdin.recv(), if stdin_open => {
                match line {
                    Some(_) => tap(&controller).await?,
                    None => stdin_open = false,
                }
            }
            _ = closed.notified() => {
                was_closed = true;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted before the ad was dismissed");
                break;
            }
        }
    }

    tapper.abort();
    let elapsed = started.elapsed();
    let playback = controller.playback();
    let layers = controller.layers();
    controller.unmount();

    match format {
        OutputFormat::Text => {
            if let Some(bar) = bar {
                bar.finish();
            }
            if opts.show_layers {
                println!("\nFinal overlay:\n{}", describe_layers(&layers));
            }
            println!(
                "\n{} after {:.1}s (playback: {}, audio: {})",
                if was_closed { "Ad closed" } else { "Ad aborted" },
                elapsed.as_secs_f64(),
                playback.phase(),
                if playback.audio_enabled() { "on" } else { "off" }
            );
        }
        OutputFormat::Json => {
            for record in pending_events(&mut events) {
                println!("{}", json_line(&record));
            }
            let summary = serde_json::json!({
                "session_id": controller.id().to_string(),
                "closed": was_closed,
                "elapsed_seconds": elapsed.as_secs_f64(),
                "phase": playback.phase(),
                "audio_enabled": playback.audio_enabled(),
                "layers": layers,
            });
            println!("{}", summary);
        }
    }

    Ok(())
}

/// List available scenarios
pub fn scenarios(format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            let rows: Vec<ScenarioRow> = Scenario::ALL.into_iter().map(ScenarioRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }
        OutputFormat::Json => {
            let list: Vec<_> = Scenario::ALL
                .iter()
                .map(|s| serde_json::json!({ "name": s.name(), "description": s.description() }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&list)?);
        }
    }
    Ok(())
}

/// Print the effective configuration
pub fn config(path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = load_config(path.as_deref())?;
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}
