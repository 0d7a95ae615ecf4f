//! # Configuration
//!
//! - `settings.rs` - process settings from environment variables
//! - `controller.rs` - workflow controller configuration parsed from the ConfigMap
//! - `shared.rs` - atomically replaced, process-wide configuration handle
//! - `validation.rs` - artifact repository secret validation
//! - `resync.rs` - ConfigMap load/validate/publish cycle
//! - `watch.rs` - ConfigMap watch that triggers a resync on change

mod controller;
mod resync;
mod settings;
mod shared;
mod validation;
mod watch;

pub use controller::{
    default_executor_image, ArtifactRepository, S3ArtifactRepository, S3Bucket,
    SecretKeySelector, WorkflowControllerConfig,
};
pub use resync::ConfigResynchronizer;
pub use settings::ControllerSettings;
pub use shared::{create_shared_config, current_config, publish_config, SharedControllerConfig};
pub use validation::validate_s3_repository;
pub use watch::start_configmap_watch;

use crate::store::StoreError;
use thiserror::Error;

/// Reasons a configuration resync is rejected
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ConfigMap '{name}' not found")]
    ConfigMapNotFound { name: String },
    #[error("failed to fetch ConfigMap '{name}': {source}")]
    ConfigMapFetch {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("ConfigMap '{name}' does not have key '{key}'")]
    MissingKey { name: String, key: String },
    #[error("failed to parse configuration in ConfigMap '{name}': {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid secret reference '{name}' key '{key}': {reason}")]
    InvalidSecretRef {
        name: String,
        key: String,
        reason: String,
    },
    #[error("secret '{name}' not found")]
    SecretNotFound { name: String },
    #[error("failed to fetch secret '{name}': {source}")]
    SecretFetch {
        name: String,
        #[source]
        source: StoreError,
    },
    #[error("secret '{name}' key '{key}' is missing or empty")]
    EmptySecretKey { name: String, key: String },
}
