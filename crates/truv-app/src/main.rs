// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// truv-replay: feeds recorded page calls through a headless bridge view and
// prints what listeners and the page would have seen.

mod transcript;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{info, warn};
use truv_bridge::{HeadlessBridge, HeadlessSurface};
use truv_core::error::Result;
use truv_core::{BridgeConfig, EventPayload, SuccessPayload};
use truv_session::{BridgeView, ReqwestHttp, TruvEventsListener};

use transcript::TranscriptEntry;

#[derive(Parser, Debug)]
#[command(name = "truv-replay")]
#[command(about = "Replay recorded Truv page calls against a headless bridge")]
#[command(version)]
struct Cli {
    /// JSON bridge configuration.  Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Load the hosted flow for this bridge token before replaying.
    #[arg(short, long, value_name = "TOKEN")]
    token: Option<String>,

    /// One `{"interface","method","arg"}` object per line.
    #[arg(value_name = "TRANSCRIPT")]
    transcript: PathBuf,
}

/// Prints every listener callback to stdout.
struct PrintingListener;

impl TruvEventsListener for PrintingListener {
    fn on_success(&self, payload: &SuccessPayload) {
        println!(
            "success public_token={} task_id={}",
            payload.public_token, payload.metadata.task_id
        );
    }

    fn on_event(&self, event: &EventPayload) {
        match event.to_json() {
            Ok(json) => println!("event {json}"),
            Err(_) => println!("event {}", event.event_type),
        }
    }

    fn on_close(&self) {
        println!("close");
    }

    fn on_load(&self) {
        println!("load");
    }

    fn on_error(&self) {
        println!("error");
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ReplaySummary {
    delivered: usize,
    rejected: usize,
}

fn replay(view: &BridgeView, entries: &[TranscriptEntry]) -> ReplaySummary {
    let mut summary = ReplaySummary::default();
    for entry in entries {
        match view.handle_call(&entry.interface, &entry.method, entry.arg.as_deref()) {
            Ok(()) => summary.delivered += 1,
            Err(e) => {
                warn!(interface = %entry.interface, method = %entry.method, error = %e, "call rejected");
                summary.rejected += 1;
            }
        }
    }
    summary
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => BridgeConfig::load(path)?,
        None => BridgeConfig::default(),
    };
    let entries = transcript::load(&cli.transcript)?;

    let surface = Arc::new(HeadlessSurface::new());
    let platform = Arc::new(HeadlessBridge::new());
    let http = Arc::new(ReqwestHttp::new(config.http_timeout())?);
    let settle = config.polling_interval();
    let view = BridgeView::new(config, surface.clone(), platform.clone(), http)?;
    view.add_event_listener(Arc::new(PrintingListener));

    if let Some(token) = &cli.token {
        view.load_bridge_token_url(token)?;
    }

    let summary = replay(&view, &entries);

    // Bridge calls into the page run in the background.
    tokio::time::sleep(settle.min(Duration::from_millis(200))).await;
    for script in surface.evaluated_scripts() {
        println!("page <- {script}");
    }
    for url in platform.opened_in_browser() {
        println!("browser <- {url}");
    }

    info!(
        delivered = summary.delivered,
        rejected = summary.rejected,
        "replay finished"
    );
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("truv-replay: {e}");
            ExitCode::FAILURE
        }
    }
}
