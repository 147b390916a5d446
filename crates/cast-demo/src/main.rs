//! Screen-cast demo entry point.
//!
//! Runs one host and several viewers on an in-process rendezvous hub, drives
//! a swipe and a key tap from the first viewer, prints the host's roster, and
//! shuts everything down.
//!
//! Settings come from a TOML file (`--config`, both the `[host]`/`[device]`/
//! `[control]` and the `[viewer]` sections are read from it); command-line
//! flags override individual values.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cast_core::Rotation;
use cast_demo::scenario::{self, ScenarioOptions};
use cast_host::infrastructure::input_injection::LoggingInjector;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Screen-cast host/viewer demo.
#[derive(Debug, Parser)]
#[command(name = "cast-demo", about = "Run a screen-cast host and viewers in one process", version)]
struct Cli {
    /// TOML configuration file.  Missing files fall back to defaults.
    #[arg(long, default_value = "cast.toml", env = "CAST_CONFIG")]
    config: PathBuf,

    /// Number of viewers to connect.
    #[arg(long, default_value_t = 2, env = "CAST_VIEWERS")]
    viewers: usize,

    /// Capture frame rate; overrides `[host] frame_rate`.
    #[arg(long, env = "CAST_FRAME_RATE")]
    frame_rate: Option<u32>,

    /// Device width in pixels; overrides `[device] width`.
    #[arg(long)]
    width: Option<u32>,

    /// Device height in pixels; overrides `[device] height`.
    #[arg(long)]
    height: Option<u32>,

    /// Clockwise quarter turns (0-3); overrides `[device] rotation`.
    #[arg(long)]
    rotation: Option<i64>,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let host_cfg = cast_host::infrastructure::storage::config::load_config(&cli.config)
        .with_context(|| format!("loading host settings from {}", cli.config.display()))?;
    let viewer_cfg = cast_viewer::infrastructure::config::load_config(&cli.config)
        .with_context(|| format!("loading viewer settings from {}", cli.config.display()))?;

    // `RUST_LOG` wins over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&host_cfg.host.log_level)),
        )
        .init();

    let options = ScenarioOptions {
        viewers: cli.viewers,
        frame_rate: cli.frame_rate.unwrap_or(host_cfg.host.frame_rate),
        width: cli.width.unwrap_or(host_cfg.device.width),
        height: cli.height.unwrap_or(host_cfg.device.height),
        rotation: cli
            .rotation
            .map(Rotation::from_quarter_turns)
            .unwrap_or_else(|| host_cfg.device.rotation()),
        constants: host_cfg.control.to_constants(),
        connect_timeout: viewer_cfg.viewer.connect_timeout(),
        injector: Arc::new(LoggingInjector::new()),
    };
    info!(
        viewers = options.viewers,
        width = options.width,
        height = options.height,
        rotation = ?options.rotation,
        "cast demo starting"
    );

    let report = scenario::run(options).await.context("demo scenario failed")?;

    println!("share id: {}", report.share_id);
    for (position, (viewer, full)) in report.roster.iter().enumerate() {
        let legs = if *full { "media+control" } else { "partial" };
        println!("  viewer {position}: {viewer} ({legs})");
    }
    println!("commands sent: {}", report.commands_sent);
    println!("legs open after shutdown: {}", report.open_legs_after);

    info!("cast demo finished");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["cast-demo"]);

        assert_eq!(cli.viewers, 2);
        assert_eq!(cli.config, PathBuf::from("cast.toml"));
        assert!(cli.frame_rate.is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["cast-demo", "--viewers", "5", "--rotation", "1", "--width", "720"]);

        assert_eq!(cli.viewers, 5);
        assert_eq!(cli.rotation, Some(1));
        assert_eq!(cli.width, Some(720));
    }
}
