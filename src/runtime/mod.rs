//! # Runtime
//!
//! - `initialization`: ordered startup of the controller
//!
//! `run` owns the process lifetime: it initializes, runs the control loop
//! until a shutdown signal arrives, then stops the background tasks.

pub mod initialization;

use crate::config::ControllerSettings;
use crate::controller::{ControlLoop, WorkflowOperator};
use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

pub use initialization::{initialize, InitializationResult};

/// Run the controller until SIGINT/SIGTERM
pub async fn run(settings: ControllerSettings, operator: Arc<dyn WorkflowOperator>) -> Result<()> {
    let InitializationResult {
        reconciler,
        bridge,
        controller_config,
        server_state,
        cancel,
        mut background,
    } = initialize(&settings).await?;

    let shutdown_state = Arc::clone(&server_state);
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = shutdown_signal().await {
            warn!("Failed to listen for shutdown signal: {e}");
            return;
        }
        info!("Received shutdown signal, stopping control loop");
        shutdown_state.set_ready(false);
        shutdown.cancel();
    });

    ControlLoop::new(operator, reconciler, controller_config)
        .run(bridge.channels, cancel.clone())
        .await;

    // The loop also returns if both watches end; make sure everything else stops
    server_state.set_ready(false);
    cancel.cancel();
    background.extend(bridge.tasks);
    for task in background {
        if let Err(e) = task.await {
            warn!("Background task failed: {e}");
        }
    }

    info!("Controller stopped");
    Ok(())
}

/// Resolves on SIGINT, or SIGTERM on unix
async fn shutdown_signal() -> std::io::Result<()> {
    #[cfg(unix)]
    {
        let mut sigterm =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result,
            _ = sigterm.recv() => Ok(()),
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await
    }
}
