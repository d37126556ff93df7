//! Preroll CLI - Terminal Ad Controller Simulator
//!
//! Features:
//! - Runs the ad controller against simulated autoplay policies
//! - Scripted or interactive play/unmute/skip taps
//! - Text countdown or JSON event stream output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;
mod scenario;

use output::OutputFormat;
use scenario::Scenario;

/// Preroll CLI - Skippable video ad simulator
#[derive(Parser)]
#[command(name = "preroll-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Simulate a full-screen video ad with autoplay fallback and skip gating", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one ad under a simulated autoplay policy
    Play {
        /// Platform behaviour to simulate
        #[arg(short, long, value_enum, default_value = "gesture")]
        scenario: Scenario,

        /// JSON configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seconds after mount at which to tap (repeatable)
        #[arg(short, long)]
        tap_at: Vec<u64>,

        /// Skip as soon as the gate opens
        #[arg(long)]
        auto_skip: bool,

        /// Delay before each play request settles (milliseconds)
        #[arg(long, default_value = "150")]
        latency_ms: u64,

        /// Print the final overlay layers
        #[arg(long)]
        layers: bool,
    },

    /// List simulated autoplay scenarios
    Scenarios,

    /// Print the effective configuration
    Config {
        /// JSON configuration file
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so stdout stays parseable
    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(level)
        .with_writer(std::io::stderr)
        .init();

    preroll_core::init();
    let format = OutputFormat::from(cli.format.as_str());

    match cli.command {
        Commands::Play { scenario, config, tap_at, auto_skip, latency_ms, layers } => {
            let opts = commands::PlayOptions {
                scenario,
                config,
                tap_at,
                auto_skip,
                latency_ms,
                show_layers: layers,
            };
            commands::play(opts, format).await?;
        }
        Commands::Scenarios => {
            commands::scenarios(format)?;
        }
        Commands::Config { path } => {
            commands::config(path)?;
        }
    }

    Ok(())
}
