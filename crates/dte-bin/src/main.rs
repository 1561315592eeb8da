//! Process entry point for the Deep Tree Echo cognitive core: wires
//! logging, configuration, and the offline provider/store pair, then
//! runs the orchestrator until an operator signal asks it to stop.

use std::process::ExitCode;
use std::sync::Arc;

use dte_config::DteConfig;
use dte_core::Orchestrator;
use dte_llm::MockProvider;
use dte_memory::InMemoryStore;
use dte_persistence::PersistenceError;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Exit code for a checkpoint file that exists but fails to parse and
/// that the operator has not explicitly asked to discard.
const EXIT_CHECKPOINT_CORRUPT: u8 = 2;
/// Exit code for any other unrecoverable startup failure (e.g. provider
/// initialization).
const EXIT_STARTUP_FAILURE: u8 = 1;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = DteConfig::from_env();
    info!(
        engine_count = cfg.clock.engine_count,
        data_dir = %cfg.persistence.state_file.display(),
        "starting Deep Tree Echo"
    );

    // Real generation and storage backends are out of scope; the offline
    // mock provider and in-process store keep the cognitive loop running
    // end to end without any external dependency.
    let provider = MockProvider::new();
    let memory: Arc<dyn dte_memory::MemoryStore> = Arc::new(InMemoryStore::new());

    let orchestrator = match Orchestrator::new(cfg, provider, memory).await {
        Ok(orchestrator) => orchestrator,
        Err(err) => {
            return match err.downcast_ref::<PersistenceError>() {
                Some(PersistenceError::Serialization(parse_err)) => {
                    error!("checkpoint file is syntactically invalid, refusing to start: {parse_err}");
                    error!("set DTE_RESET_CORRUPT_CHECKPOINT=true to discard it and start fresh");
                    ExitCode::from(EXIT_CHECKPOINT_CORRUPT)
                }
                _ => {
                    error!("failed to start: {err:#}");
                    ExitCode::from(EXIT_STARTUP_FAILURE)
                }
            };
        }
    };

    orchestrator.start().await;
    info!("running; send SIGINT or SIGTERM to stop");

    shutdown_signal().await;
    info!("shutdown signal received, stopping");
    orchestrator.stop().await;
    info!("stopped cleanly");
    ExitCode::SUCCESS
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to listen for ctrl+c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to listen for SIGTERM")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}
