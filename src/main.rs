//! # Workflow Controller
//!
//! Kubernetes controller that keeps `Workflow` node statuses in step with the
//! pods running each step.
//!
//! ## Overview
//!
//! 1. **Watches workflows and workflow pods** in one namespace
//! 2. **Reconciles node status** from pod phase, readiness and outputs
//! 3. **Hands workflows to the operator** together with the active configuration
//! 4. **Reloads configuration** from the controller ConfigMap when it changes
//!
//! Settings come from environment variables (`POD_NAMESPACE`, `CONFIG_MAP_NAME`,
//! `METRICS_PORT`, `LOG_FORMAT`, `CONFIG_WATCH_ENABLED`); the flags below
//! override them.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use workflow_controller::config::ControllerSettings;
use workflow_controller::controller::LoggingOperator;
use workflow_controller::runtime;

/// Workflow controller
#[derive(Parser, Debug)]
#[command(name = "workflow-controller", version, about, long_about = None)]
struct Cli {
    /// Namespace to watch for workflows and pods
    #[arg(short, long)]
    namespace: Option<String>,

    /// Name of the controller ConfigMap
    #[arg(long)]
    configmap: Option<String>,

    /// Port for metrics and probes
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Log format (text, json)
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    fn apply(self, mut settings: ControllerSettings) -> ControllerSettings {
        if let Some(namespace) = self.namespace {
            settings.namespace = namespace;
        }
        if let Some(name) = self.configmap {
            settings.config_map_name = name;
        }
        if let Some(port) = self.metrics_port {
            settings.metrics_port = port;
        }
        if let Some(format) = self.log_format {
            settings.log_format = format;
        }
        settings
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Cli::parse().apply(ControllerSettings::from_env());
    runtime::run(settings, Arc::new(LoggingOperator)).await
}
