//! Propsizer Worker
//!
//! Reads newline-delimited JSON engine events from stdin and writes engine
//! outputs (decisions, reversal triggers, expired signals) to stdout, one
//! JSON object per line.

use dotenvy::dotenv;
use propsizer::config::{get_environment, EngineConfig};
use propsizer::core::engine::SizingEngine;
use propsizer::core::runtime::{EngineEvent, EngineOutput, EngineRuntime};
use propsizer::logging;
use propsizer::metrics::Metrics;
use std::env;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env if present
    dotenv().ok();

    logging::init_logging();

    let env = get_environment();
    info!("Starting Propsizer Worker");
    info!(environment = %env, "Environment");

    let config = EngineConfig::from_env().map_err(|e| {
        error!(error = %e, "Refusing to start");
        e
    })?;
    info!(?config, "Configuration loaded");

    let queue_depth: usize = env::var("WORKER_QUEUE_DEPTH")
        .ok()
        .and_then(|d| d.parse().ok())
        .unwrap_or(1024);

    let metrics = Arc::new(Metrics::new()?);
    let engine = SizingEngine::new(config)?.with_metrics(metrics.clone());

    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(queue_depth);
    let (output_tx, mut output_rx) = mpsc::channel::<EngineOutput>(queue_depth);
    let runtime = EngineRuntime::new(engine).spawn(event_rx, output_tx);

    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(output) = output_rx.recv().await {
            match serde_json::to_string(&output) {
                Ok(line) => {
                    stdout.write_all(line.as_bytes()).await?;
                    stdout.write_all(b"\n").await?;
                    stdout.flush().await?;
                }
                Err(e) => warn!(error = %e, "Failed to serialize engine output"),
            }
        }
        Ok::<(), std::io::Error>(())
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    info!("Input closed");
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<EngineEvent>(&line) {
                    Ok(event) => {
                        if event_tx.send(event).await.is_err() {
                            warn!("Engine runtime stopped accepting events");
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "Skipping malformed event"),
                }
            }
        }
    }

    drop(event_tx);
    let engine = runtime.await?;
    writer.await??;

    info!(budget = ?engine.budget(), "Worker stopped");
    debug!(metrics = %metrics.render(), "Final metrics");
    Ok(())
}
