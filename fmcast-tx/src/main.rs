//! Transmitter (fmcast-tx) - Main entry point
//!
//! Decodes a playlist with ffmpeg and streams it as one continuous WAV
//! stream into fm_transmitter's stdin.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fmcast_common::config::{load_toml_config, LoggingConfig};
use fmcast_tx::config::{ConfigOverrides, StreamConfiguration};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for fmcast-tx
#[derive(Parser, Debug)]
#[command(name = "fmcast-tx")]
#[command(about = "Stream a playlist to fm_transmitter as one continuous PCM stream")]
#[command(version)]
struct Args {
    /// Carrier frequency in MHz
    #[arg(short, long, env = "FMCAST_FREQ")]
    freq: f64,

    /// Decoder executable (ffmpeg-compatible)
    #[arg(long, alias = "ffmpeg", env = "FMCAST_DECODER")]
    decoder: Option<PathBuf>,

    /// Consumer executable (fm_transmitter-compatible)
    #[arg(long, env = "FMCAST_CONSUMER")]
    consumer: Option<PathBuf>,

    /// Output sample rate in Hz
    #[arg(long, env = "FMCAST_SAMPLE_RATE")]
    sample_rate: Option<u32>,

    /// Output channel count
    #[arg(long, env = "FMCAST_CHANNELS")]
    channels: Option<u16>,

    /// TOML config file (default: ~/.config/fmcast/config.toml)
    #[arg(short, long, env = "FMCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Audio files, streamed in the given order
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize tracing (stderr; stdout stays free for the consumer).
    // Installed before the config file is read so its lookup is logged too.
    let rust_log_set = std::env::var_os(EnvFilter::DEFAULT_ENV).is_some();
    let (filter, filter_handle) = reload::Layer::new(
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(LoggingConfig::default().level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let toml_config =
        load_toml_config(args.config.as_deref()).context("Failed to load configuration")?;

    if let Some(configured) = configured_filter(rust_log_set, &toml_config.logging) {
        filter_handle
            .reload(configured)
            .context("Failed to apply configured log level")?;
    }

    let overrides = ConfigOverrides {
        decoder_path: args.decoder,
        consumer_path: args.consumer,
        sample_rate: args.sample_rate,
        channels: args.channels,
    };
    let config = StreamConfiguration::resolve(args.freq, &overrides, &toml_config);

    info!(
        frequency = %config.frequency_arg(),
        decoder = %config.decoder_path.display(),
        consumer = %config.consumer_path.display(),
        tracks = args.files.len(),
        "Starting fmcast transmitter"
    );

    let report = fmcast_tx::run(&args.files, &config)
        .await
        .context("Streaming session failed")?;

    info!(
        session_id = %report.session_id,
        tracks = report.tracks_streamed,
        bytes = report.bytes_written,
        "Playlist delivered"
    );
    Ok(())
}

/// Filter from the config file's `[logging]` table, unless RUST_LOG wins
fn configured_filter(rust_log_set: bool, logging: &LoggingConfig) -> Option<EnvFilter> {
    if rust_log_set {
        None
    } else {
        Some(EnvFilter::new(&logging.level))
    }
}
