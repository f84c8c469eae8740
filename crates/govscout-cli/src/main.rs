mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use std::io;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use govscout_core::{load_config, IngestConfig, RecordingObserver, ReqwestHttpClient};
use time::OffsetDateTime;
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::Cli;
use crate::commands::Runtime;
use crate::error::CliError;
use crate::metadata::Metadata;
use crate::output::Envelope;

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    let started = Instant::now();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => IngestConfig::default(),
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cutting rate-limit waits short");
            let _ = shutdown_tx.send(true);
        }
    });

    let observer = Arc::new(RecordingObserver::new());
    let runtime = Runtime {
        http_client: Arc::new(ReqwestHttpClient::new()),
        observer: observer.clone(),
        shutdown: shutdown_rx,
        today: OffsetDateTime::now_utc().date(),
    };

    let command = commands::command_name(&cli.command);
    let result = commands::run(&cli.command, config, runtime).await?;

    let mut meta = Metadata::new(command);
    meta.latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    let envelope = Envelope::new(meta, result, observer.events());
    info!(
        command,
        count = envelope.count,
        failures = envelope.meta.failure_count,
        "command finished"
    );

    output::render(io::stdout().lock(), &envelope, cli.format, cli.pretty)?;

    if cli.strict && envelope.meta.failure_count > 0 {
        return Err(CliError::StrictModeViolation {
            failure_count: envelope.meta.failure_count,
        });
    }
    Ok(())
}
