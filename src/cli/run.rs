use crate::config::parse::load_config;
use crate::observer::{Observer, StatsObserver};
use crate::output;
use crate::pipeline::run_pipeline;
use crate::source::read_events;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::BufReader;
use tokio::signal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("input error: {0}")]
    Input(#[from] crate::source::ReaderError),

    #[error("failed to open input '{path}': {source}")]
    OpenInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] crate::pipeline::PipelineError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("config not found, use --config <path> or run 'logsocket config init'")]
    ConfigNotFound,
}

pub async fn run(config_path: Option<PathBuf>, input_override: Option<PathBuf>) -> Result<(), RunError> {
    let config_path = config_path.ok_or(RunError::ConfigNotFound)?;
    run_shipper(&config_path, input_override).await
}

async fn run_shipper(config_path: &Path, input_override: Option<PathBuf>) -> Result<(), RunError> {
    info!(config_path = %config_path.display(), "Loading configuration");
    let config = load_config(config_path)?;
    let ws = &config.output.websocket;

    let stats = Arc::new(StatsObserver::new());
    let observer: Arc<dyn Observer> = stats.clone();
    let group = output::websocket(ws, observer.clone());
    info!(
        url = %ws.target_url(),
        workers = ws.workers,
        batch_size = ws.batch_size,
        retry_limit = ws.retry_limit,
        "Websocket output configured"
    );

    let shutdown = CancellationToken::new();
    let (event_tx, event_rx) = mpsc::channel(ws.batch_size);

    let input_path = input_override.or_else(|| config.input.path.clone());
    let reader_handle = match input_path {
        Some(path) => {
            info!(path = %path.display(), "Reading events from file");
            let file = File::open(&path)
                .await
                .map_err(|source| RunError::OpenInput {
                    path: path.clone(),
                    source,
                })?;
            tokio::spawn(read_events(BufReader::new(file), event_tx))
        }
        None => {
            info!("Reading events from stdin");
            tokio::spawn(read_events(BufReader::new(tokio::io::stdin()), event_tx))
        }
    };

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Shutdown signal received");
            signal_token.cancel();
        }
    });

    let pipeline_result = run_pipeline(
        group,
        observer,
        event_rx,
        config.input.flush_interval,
        shutdown.clone(),
    )
    .await;

    // Stdin may never reach EOF once nothing consumes it
    if shutdown.is_cancelled() || pipeline_result.is_err() {
        reader_handle.abort();
    } else {
        match reader_handle.await? {
            Ok(read) => info!(
                lines = read.lines,
                events = read.events,
                skipped = read.skipped,
                "Input finished"
            ),
            Err(e) => error!(error = %e, "Input reader failed"),
        }
    }

    let snapshot = stats.snapshot();
    info!(
        batches = snapshot.batches,
        acked = snapshot.acked,
        dropped = snapshot.dropped,
        retried = snapshot.retried,
        failed = snapshot.failed,
        "Shipping stats"
    );
    if snapshot.failed > 0 {
        warn!(failed = snapshot.failed, "Some events were not delivered");
    }

    pipeline_result?;
    Ok(())
}
