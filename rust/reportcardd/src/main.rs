mod config;
mod db;
mod export;
mod ipc;
mod metrics;
mod model;
mod narrative;
mod store;

use clap::Parser;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    let _ = dotenvy::dotenv();
    let args = config::Args::parse();

    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("reportcardd={},warn", args.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    let generator = match narrative::GeminiClient::from_args(&args) {
        Ok(g) => g,
        Err(e) => {
            error!("Failed to build text generation client: {}", e);
            std::process::exit(1);
        }
    };
    if args.ai_api_key.is_none() {
        warn!("REPORTCARD_AI_API_KEY is not set; narrative generation will fail");
    }

    let mut state = ipc::AppState::new(
        Box::new(generator),
        ipc::ExportSettings {
            settle: args.export_settle(),
            pixel_ratio: args.export_pixel_ratio,
        },
    );

    info!(version = env!("CARGO_PKG_VERSION"), "reportcardd starting");

    if let Some(path) = args.workspace.as_deref() {
        if let Err(e) = ipc::select_workspace(&mut state, path) {
            error!(workspace = %path.display(), "failed to open workspace: {:?}", e);
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let resp = match serde_json::from_str::<ipc::Request>(&line) {
            Ok(req) => ipc::handle_request(&mut state, req),
            // Can't reply with an id we couldn't read.
            Err(e) => ipc::bad_json(e.to_string()),
        };
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed; shutting down");
}
