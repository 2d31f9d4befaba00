//! event-digest: binary entrypoint.
//! Runs one cadence once; meant to be triggered by cron or a systemd timer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use event_digest::config;
use event_digest::notify::StdoutPreview;
use event_digest::{Cadence, Pipeline};

#[derive(Debug, Parser)]
#[command(name = "event-digest", version, about = "Post community event digests to chat channels")]
struct Cli {
    /// Which digest to send: weekly, daily or upcoming
    cadence: Cadence,

    /// Print messages to stdout instead of publishing them
    #[arg(long)]
    preview: bool,

    /// Config file (TOML). Defaults to $EVENT_DIGEST_CONFIG, then config/event-digest.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("event_digest=info,warn"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(fmt::layer().compact().with_writer(std::io::stderr)).init();
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let path = cli.config.unwrap_or_else(config::default_path);
    let settings = config::load_from(&path)
        .with_context(|| format!("loading config {}", path.display()))?;

    let pipeline = Pipeline::from_settings_with_http(&settings, Arc::new(StdoutPreview))
        .context("building pipeline")?;

    let cadence = cli.cadence;
    let report = pipeline.run(cadence, cli.preview, chrono::Utc::now()).await;

    tracing::info!(
        %cadence,
        fetched = report.fetched,
        selected = report.selected,
        delivered = ?report.delivered,
        "cycle finished"
    );

    if !report.is_clean() {
        for e in &report.fetch_failures {
            tracing::error!("{e}");
        }
        for e in &report.notify_failures {
            tracing::error!("{e}");
        }
        bail!(
            "{} source(s) and {} channel(s) failed",
            report.fetch_failures.len(),
            report.notify_failures.len()
        );
    }
    Ok(())
}
