//! CLI entry point for guarded-fetch.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use guarded_fetch::{DownloadRequest, Downloader, TransferOutcome};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

mod app_config;
mod cli;
mod progress_ui;

use app_config::{load_default_file_config, resolve_settings};
use cli::Args;

/// Fetch failed or was cancelled.
const EXIT_FETCH_FAILED: u8 = 1;
/// Invalid arguments or configuration.
const EXIT_USAGE: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(EXIT_USAGE)
        }
    }
}

async fn run() -> Result<ExitCode> {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    let file_config = if args.no_config {
        None
    } else {
        load_default_file_config()?
    };
    let settings = resolve_settings(&args, file_config.as_ref());

    // Priority: RUST_LOG env var > quiet flag > verbose flag > config file > info
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(settings.log_directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, ?settings, "CLI arguments resolved");

    let downloader =
        Downloader::new(&settings.downloader).context("Invalid downloader configuration")?;

    let mut request = DownloadRequest::new(args.url.clone())
        .with_context(|| format!("Invalid remote address '{}'", args.url))?;
    if let Some(output) = &args.output {
        request = request.with_local_path(output);
    }
    if let Some(timeout) = settings.timeout {
        request = request.with_timeout(timeout);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_watcher(cancel.clone());
    request = request.with_cancellation(cancel);

    let bar = progress_ui::progress_bar(!(args.no_progress || args.quiet || args.json), &args.url);
    if let Some(bar) = &bar {
        let bar = bar.clone();
        request = request.with_progress(move |fraction| progress_ui::set_fraction(&bar, fraction));
    }

    let outcome = downloader.download(request).await;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }
    report(&outcome, args.json)?;

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_FETCH_FAILED)
    })
}

/// Cancels `cancel` on Ctrl+C.
fn spawn_interrupt_watcher(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling download");
            cancel.cancel();
        }
    });
}

fn report(outcome: &TransferOutcome, json: bool) -> Result<()> {
    if json {
        let rendered = serde_json::to_string_pretty(&outcome.summary())
            .context("Failed to serialize outcome")?;
        println!("{rendered}");
        return Ok(());
    }

    match (outcome.local_path(), outcome.error()) {
        (Some(path), _) => println!("{}", path.display()),
        (None, Some(error)) => eprintln!("Download failed: {error}"),
        (None, None) => {}
    }
    Ok(())
}
