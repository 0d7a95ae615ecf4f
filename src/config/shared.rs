//! # Shared Configuration
//!
//! Process-wide handle to the active workflow controller configuration.
//!
//! The configuration value itself is immutable; the handle holds an `Arc` to it
//! and a resync publishes a new version by swapping that `Arc` in one write.
//! Readers take a snapshot and never see a partially updated value.

use crate::config::WorkflowControllerConfig;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, hot-reloadable workflow controller configuration
pub type SharedControllerConfig = Arc<RwLock<Arc<WorkflowControllerConfig>>>;

/// Create the shared configuration holding defaults until the first resync
pub fn create_shared_config() -> SharedControllerConfig {
    Arc::new(RwLock::new(Arc::new(
        WorkflowControllerConfig::default().with_defaults(),
    )))
}

/// Snapshot of the currently active configuration
pub async fn current_config(shared: &SharedControllerConfig) -> Arc<WorkflowControllerConfig> {
    Arc::clone(&*shared.read().await)
}

/// Publish a new configuration
pub async fn publish_config(shared: &SharedControllerConfig, config: Arc<WorkflowControllerConfig>) {
    *shared.write().await = config;
}
