//! Drowsiness Monitor - Main Entry Point

use anyhow::Context;
use api::{init_logging, run, Settings};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "drowsiness-monitor", version, about = "Driver drowsiness monitor with live dashboard")]
struct Cli {
    /// Settings file (TOML)
    #[arg(short, long, default_value = "dms.toml")]
    config: PathBuf,

    /// Landmark recording to replay, overrides camera.recording
    #[arg(short, long)]
    recording: Option<PathBuf>,

    /// HTTP port, overrides server.port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load_from_file(&cli.config)
        .with_context(|| format!("loading settings from {}", cli.config.display()))?;
    if let Some(recording) = cli.recording {
        settings.camera.recording = Some(recording);
    }
    if let Some(port) = cli.port {
        settings.server.port = port;
    }
    settings.validate().context("validating settings")?;

    init_logging(&settings.logging);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        "EAR close {:.2} over {} frames, MAR {:.2}/{:.2}, {} yawns in {:.0}s",
        settings.engine.ear_close_threshold,
        settings.engine.ear_consec_frames,
        settings.engine.mar_open_threshold,
        settings.engine.mar_close_threshold,
        settings.engine.yawn_series_count,
        settings.engine.yawn_series_window_secs
    );

    run(settings).await.context("drowsiness monitor failed")?;

    info!("Shutdown complete");
    Ok(())
}
