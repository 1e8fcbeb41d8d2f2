//! hpui-replay - drive recorded fingertip samples through the gesture engine
//! and print the resulting events as s-expressions.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use hpui_core::replay::{self, DetectionKind, ReplayScript};
use hpui_core::InteractorConfig;

#[derive(Parser, Debug)]
#[command(name = "hpui-replay", about = "Replay fingertip samples against touch surfaces")]
struct Cli {
    /// Replay script: one (:surface ...) or (:frame ...) form per line
    #[arg(long)]
    script: PathBuf,

    /// Interactor config plist (default: built-in defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Detection logic used to find candidates
    #[arg(long, value_enum, default_value = "distance")]
    detection: DetectionKind,

    /// Override the commit delay
    #[arg(long)]
    commit_delay_ms: Option<f64>,

    /// Override the debounce window
    #[arg(long)]
    debounce_window_ms: Option<f64>,

    /// Override the tracking switch threshold
    #[arg(long)]
    switch_tracking_threshold: Option<f32>,

    /// Print the effective config before replaying
    #[arg(long)]
    print_config: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hpui_core=info".into()),
        )
        .init();

    info!("hpui-replay v{} starting", env!("CARGO_PKG_VERSION"));

    let mut config = match &cli.config {
        Some(path) => InteractorConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => InteractorConfig::default(),
    };
    if let Some(ms) = cli.commit_delay_ms {
        config.gesture.commit_delay_ms = ms;
    }
    if let Some(ms) = cli.debounce_window_ms {
        config.gesture.debounce_window_ms = ms;
    }
    if let Some(threshold) = cli.switch_tracking_threshold {
        config.gesture.switch_tracking_threshold = threshold;
    }
    config.validate().context("invalid config overrides")?;

    if cli.print_config {
        println!("{}", config.config_sexp());
    }

    let script = ReplayScript::load(&cli.script)
        .with_context(|| format!("reading script {}", cli.script.display()))?;
    info!("script: {}", replay::script_summary_sexp(&script));

    for line in replay::run(&script, config, cli.detection)? {
        println!("{line}");
    }
    Ok(())
}
